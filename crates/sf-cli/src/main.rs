// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::process::ExitCode;

use clap::Parser;
use sf_cli::{inline_folder_spec, overrides_from, Cli, Commands};
use sf_config::NormalizedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "smartfolder exited with an error");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Validate { config }) => {
            // Validation never needs logging set up; it's a pure parse/check.
            sf_config::load_and_normalize(&config, &sf_config::CliOverrides::default())?;
            println!("{} is valid", config.display());
            Ok(())
        }
        Some(Commands::Run { config, dry_run, run_once, logging }) => {
            logging.init("smartfolder")?;
            sf_core::run_from_config_file(&config, &overrides_from(dry_run), run_once).await?;
            Ok(())
        }
        None => {
            cli.logging.init("smartfolder")?;
            let folder = cli
                .folder
                .ok_or_else(|| anyhow::anyhow!("a folder argument is required in inline mode"))?;
            let prompt = cli
                .prompt
                .ok_or_else(|| anyhow::anyhow!("--prompt is required in inline mode"))?;

            let spec = inline_folder_spec(folder, prompt, cli.dry_run)?;
            sf_core::run(NormalizedConfig::Folders(vec![spec]), cli.run_once).await?;
            Ok(())
        }
    }
}
