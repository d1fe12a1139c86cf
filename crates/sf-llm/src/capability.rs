// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Static model capability registry and the body-inclusion selector (C4).

use sf_fs::Category;

#[derive(Debug, Clone, Copy)]
pub struct Capability {
    pub id: &'static str,
    pub supports_text: bool,
    pub supports_image: bool,
    pub supports_pdf: bool,
    pub supports_audio: bool,
    pub supports_video: bool,
    pub max_input_tokens: u64,
    pub input_cost_per_million: f64,
    pub best_for: &'static [Category],
}

pub const DEFAULT_CAPABILITY_ID: &str = "openai/gpt-4o-mini";

/// Registry of known "provider/model" capabilities. Real deployments would
/// refresh this from the gateway; this core ships a static table covering
/// the models the selector needs to reason about.
pub const REGISTRY: &[Capability] = &[
    Capability {
        id: "openai/gpt-4o-mini",
        supports_text: true,
        supports_image: true,
        supports_pdf: false,
        supports_audio: false,
        supports_video: false,
        max_input_tokens: 128_000,
        input_cost_per_million: 0.15,
        best_for: &[Category::Text, Category::Code, Category::Data],
    },
    Capability {
        id: "openai/gpt-4o",
        supports_text: true,
        supports_image: true,
        supports_pdf: true,
        supports_audio: false,
        supports_video: false,
        max_input_tokens: 128_000,
        input_cost_per_million: 2.50,
        best_for: &[Category::Image, Category::Pdf, Category::Office],
    },
    Capability {
        id: "google/gemini-1.5-pro",
        supports_text: true,
        supports_image: true,
        supports_pdf: true,
        supports_audio: true,
        supports_video: true,
        max_input_tokens: 2_000_000,
        input_cost_per_million: 1.25,
        best_for: &[Category::Video, Category::Audio, Category::Archive],
    },
    Capability {
        id: "anthropic/claude-3-5-sonnet",
        supports_text: true,
        supports_image: true,
        supports_pdf: true,
        supports_audio: false,
        supports_video: false,
        max_input_tokens: 200_000,
        input_cost_per_million: 3.00,
        best_for: &[Category::Text, Category::Code, Category::Pdf],
    },
];

pub fn lookup(id: &str) -> Option<&'static Capability> {
    REGISTRY.iter().find(|c| c.id == id)
}

fn default_capability() -> &'static Capability {
    lookup(DEFAULT_CAPABILITY_ID).expect("default capability must be registered")
}

/// Select the best-scoring capability for `category`/`size_bytes`, honoring
/// an explicit `user_pref` when it names a registered capability (`spec.md`
/// §4.4).
pub fn select(category: Category, size_bytes: u64, user_pref: Option<&str>) -> &'static Capability {
    if let Some(pref) = user_pref {
        if let Some(cap) = lookup(pref) {
            return cap;
        }
    }

    let candidates: Vec<&Capability> = REGISTRY.iter().filter(|c| c.best_for.contains(&category)).collect();
    let candidates = if candidates.is_empty() {
        vec![default_capability()]
    } else {
        candidates
    };

    let mut best: Option<(&Capability, f64)> = None;
    for cap in candidates {
        let mut score = 0.0;
        if cap.supports_video && category == Category::Video {
            score += 100.0;
        }
        if cap.supports_audio && category == Category::Audio {
            score += 100.0;
        }
        if (cap.supports_pdf && category == Category::Pdf) || (cap.supports_image && category == Category::Image) {
            score += 50.0;
        }
        if cap.input_cost_per_million > 0.0 {
            score += 10.0 / cap.input_cost_per_million;
        }
        if size_bytes > 50_000 && cap.max_input_tokens > 500_000 {
            score += 20.0;
        }

        match &best {
            Some((_, best_score)) if *best_score >= score => {}
            _ => best = Some((cap, score)),
        }
    }

    best.map(|(cap, _)| cap).unwrap_or_else(default_capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_user_pref_wins_verbatim() {
        let cap = select(Category::Text, 100, Some("anthropic/claude-3-5-sonnet"));
        assert_eq!(cap.id, "anthropic/claude-3-5-sonnet");
    }

    #[test]
    fn unregistered_user_pref_falls_back_to_scoring() {
        let cap = select(Category::Video, 100, Some("nonexistent/model"));
        assert_eq!(cap.id, "google/gemini-1.5-pro");
    }

    #[test]
    fn video_category_prefers_native_video_support() {
        let cap = select(Category::Video, 1_000_000, None);
        assert_eq!(cap.id, "google/gemini-1.5-pro");
    }

    #[test]
    fn unmatched_category_falls_back_to_default() {
        let cap = select(Category::Folder, 10, None);
        assert_eq!(cap.id, DEFAULT_CAPABILITY_ID);
    }

    #[test]
    fn large_file_with_big_context_model_gets_bonus() {
        let cap = select(Category::Audio, 10_000_000, None);
        assert_eq!(cap.id, "google/gemini-1.5-pro");
    }
}
