//! Placeholder substitution: `{{ key }}` tokens expanded against a
//! string-to-string context.
//!
//! Unknown tokens are left untouched during the first pass; a final re-scan
//! that still finds a token means some key was missing, and the whole
//! substitution fails. This yields a single deterministic failure whether a
//! missing key appears once or many times, and never sends a partially
//! substituted string downstream.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^\s}]+)\s*\}\}").expect("placeholder regex"))
}

/// Expand every `{{ key }}` token in `template` using `data`.
///
/// Returns `None` when at least one key is absent from `data` (or a
/// substituted value itself reads as a placeholder token).
pub fn substitute(template: &str, data: &HashMap<String, String>) -> Option<String> {
    let re = placeholder_re();

    let result = re.replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        match data.get(key) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    });

    if re.is_match(&result) {
        return None;
    }
    Some(result.into_owned())
}

/// Load-time variant: replace each `{{ key }}` with the quoted literal
/// `"key"` so a filter expression can be parsed without a runtime context.
pub fn substitute_for_validation(template: &str) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| format!("\"{}\"", &caps[1]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn single_key() {
        let data = ctx(&[("a.id", "42")]);
        assert_eq!(
            substitute("http://h/{{ a.id }}", &data),
            Some("http://h/42".to_string())
        );
    }

    #[test]
    fn repeated_and_multiple_keys() {
        let data = ctx(&[("x", "1"), ("y", "2")]);
        assert_eq!(
            substitute("{{ x }}+{{ y }}={{ x }}{{ y }}", &data),
            Some("1+2=12".to_string())
        );
    }

    #[test]
    fn whitespace_inside_braces_is_optional() {
        let data = ctx(&[("k", "v")]);
        assert_eq!(substitute("{{k}}", &data), Some("v".to_string()));
        assert_eq!(substitute("{{  k  }}", &data), Some("v".to_string()));
    }

    #[test]
    fn keys_may_contain_dots_dashes_underscores() {
        let data = ctx(&[("fetch-1.result_key", "ok")]);
        assert_eq!(
            substitute("{{ fetch-1.result_key }}", &data),
            Some("ok".to_string())
        );
    }

    #[test]
    fn missing_key_fails() {
        let data = ctx(&[("known", "v")]);
        assert_eq!(substitute("{{ known }} {{ unknown }}", &data), None);
    }

    #[test]
    fn missing_key_fails_even_when_repeated() {
        let data = ctx(&[]);
        assert_eq!(substitute("{{ gone }} and {{ gone }}", &data), None);
    }

    #[test]
    fn no_tokens_passes_through() {
        let data = ctx(&[]);
        assert_eq!(substitute("plain text", &data), Some("plain text".to_string()));
        assert_eq!(substitute("", &data), Some(String::new()));
    }

    #[test]
    fn substituted_value_that_looks_like_a_token_fails() {
        // The re-scan rejects values that reintroduce a placeholder.
        let data = ctx(&[("k", "{{ other }}")]);
        assert_eq!(substitute("{{ k }}", &data), None);
    }

    #[test]
    fn raw_json_values_embed_verbatim() {
        let data = ctx(&[("a.obj", r#"{"n": [1, 2]}"#), ("a.s", r#""quoted""#)]);
        assert_eq!(
            substitute(r#"{"payload": {{ a.obj }}, "s": {{ a.s }}}"#, &data),
            Some(r#"{"payload": {"n": [1, 2]}, "s": "quoted"}"#.to_string())
        );
    }

    // Property: substitution over a fully covered template is idempotent.
    #[test]
    fn substitution_is_idempotent() {
        let data = ctx(&[("a", "1"), ("b", "two")]);
        let template = "{{ a }}-{{ b }}-{{ a }}";
        let once = substitute(template, &data).unwrap();
        let twice = substitute(&once, &data).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn validation_variant_quotes_keys() {
        assert_eq!(
            substitute_for_validation("{{ a.n }} > 7 && {{ b }} == \"x\""),
            "\"a.n\" > 7 && \"b\" == \"x\""
        );
    }

    #[test]
    fn validation_variant_leaves_plain_text_alone() {
        assert_eq!(substitute_for_validation("1 < 2"), "1 < 2");
    }
}
