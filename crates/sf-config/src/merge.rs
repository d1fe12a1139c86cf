// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON merge helper shared by the config layering pipeline.
//!
//! Objects merge recursively; arrays and scalars are replaced wholesale by
//! the higher-precedence layer. `null` in the higher layer never erases a
//! value set by a lower one.

use serde_json::Value as J;

pub fn merge_two_json(base: &mut J, layer: J) {
    match (base, layer) {
        (J::Object(a), J::Object(b)) => {
            for (k, v) in b {
                merge_two_json(a.entry(k).or_insert(J::Null), v);
            }
        }
        (a @ J::Array(_), J::Array(b)) => *a = J::Array(b),
        (_, J::Null) => {}
        (a, b) => *a = b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_nested_objects() {
        let mut base = json!({"a": {"b": 1}});
        merge_two_json(&mut base, json!({"a": {"c": 2}}));
        assert_eq!(base, json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn replaces_arrays_wholesale() {
        let mut base = json!({"arr": [1, 2, 3]});
        merge_two_json(&mut base, json!({"arr": [9]}));
        assert_eq!(base, json!({"arr": [9]}));
    }

    #[test]
    fn null_layer_keeps_base_value() {
        let mut base = json!({"k": "v"});
        merge_two_json(&mut base, json!({"k": null}));
        assert_eq!(base, json!({"k": "v"}));
    }
}
