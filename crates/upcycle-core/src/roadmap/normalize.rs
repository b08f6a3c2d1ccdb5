//! Text cleanup applied to raw model output before JSON parsing.
//!
//! Everything here is purely textual: no function parses JSON or fails.
//! A response with no array markers comes back unchanged apart from
//! fence and whitespace stripping, and the parser reports the problem.

use serde::{Deserialize, Serialize};

const FENCE: &str = "```";
const LANGUAGE_TAG: &str = "json";

/// Whether to rewrite scripting-language literals into JSON literals.
///
/// `Coerce` replaces every `'` with `"` and every `None`/`True`/`False`
/// with `null`/`true`/`false`, wherever they occur. This also rewrites
/// those characters inside string values (an apostrophe in a title breaks
/// the JSON). `Off` accepts strict JSON only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralRepair {
    #[default]
    Coerce,
    Off,
}

/// Clean a raw model response into candidate JSON array text.
pub fn normalize_response(raw: &str, repair: LiteralRepair) -> String {
    let unfenced = strip_code_fence(raw);
    let cleaned = unfenced.trim().trim_matches('`').trim();

    let repaired = match repair {
        LiteralRepair::Coerce => coerce_literals(cleaned),
        LiteralRepair::Off => cleaned.to_owned(),
    };

    match slice_json_array(&repaired) {
        Some(array) => array.to_owned(),
        None => repaired,
    }
}

/// The substring from the first `[` through the last `]`, if both exist
/// in that order.
pub fn slice_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Keep the content of the first fenced block, minus a leading `json` tag.
/// Text without a fence is returned as-is.
fn strip_code_fence(text: &str) -> &str {
    let mut parts = text.split(FENCE);
    parts.next();
    match parts.next() {
        Some(inner) => {
            let inner = inner.trim();
            inner.strip_prefix(LANGUAGE_TAG).map_or(inner, str::trim)
        }
        None => text,
    }
}

fn coerce_literals(text: &str) -> String {
    text.replace('\'', "\"")
        .replace("None", "null")
        .replace("True", "true")
        .replace("False", "false")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRAY: &str = r#"[{"step_number":1,"title":"T"}]"#;

    fn normalize(raw: &str) -> String {
        normalize_response(raw, LiteralRepair::Coerce)
    }

    #[test]
    fn strips_fence_with_language_tag() {
        let raw = format!("```json\n{ARRAY}\n```");
        assert_eq!(normalize(&raw), ARRAY);
    }

    #[test]
    fn strips_fence_without_language_tag() {
        let raw = format!("```\n{ARRAY}\n```");
        assert_eq!(normalize(&raw), ARRAY);
    }

    #[test]
    fn strips_unterminated_fence() {
        let raw = format!("```json\n{ARRAY}");
        assert_eq!(normalize(&raw), ARRAY);
    }

    #[test]
    fn keeps_only_first_fenced_block() {
        let raw = format!("Here you go:\n```json\n{ARRAY}\n```\nand also\n```\n[2]\n```");
        assert_eq!(normalize(&raw), ARRAY);
    }

    #[test]
    fn trims_commentary_around_array() {
        let raw = format!("Sure! {ARRAY} Hope this helps!");
        assert_eq!(normalize(&raw), ARRAY);
    }

    #[test]
    fn slices_from_first_open_to_last_close() {
        let raw = r#"steps: [{"materials_needed":["a","b"]}] (see [1])"#;
        assert_eq!(normalize(raw), r#"[{"materials_needed":["a","b"]}] (see [1]"#);
    }

    #[test]
    fn coerces_scripting_literals() {
        let raw = "[{'done': True, 'skip': False, 'note': None}]";
        assert_eq!(
            normalize(raw),
            r#"[{"done": true, "skip": false, "note": null}]"#
        );
    }

    #[test]
    fn repair_off_leaves_literals_alone() {
        let raw = "[{'done': True}]";
        assert_eq!(normalize_response(raw, LiteralRepair::Off), raw);
    }

    #[test]
    fn coercion_rewrites_apostrophes_inside_strings() {
        // Known lossy behaviour of literal coercion.
        let raw = r#"[{"title": "Don't glue yet"}]"#;
        assert_eq!(normalize(raw), r#"[{"title": "Don"t glue yet"}]"#);
    }

    #[test]
    fn text_without_brackets_passes_through() {
        assert_eq!(normalize("not json at all"), "not json at all");
    }

    #[test]
    fn reversed_brackets_pass_through() {
        assert_eq!(normalize("] nothing here ["), "] nothing here [");
    }

    #[test]
    fn strips_stray_backticks_and_whitespace() {
        assert_eq!(normalize(&format!("  `{ARRAY}`\n")), ARRAY);
    }

    #[test]
    fn slice_json_array_cases() {
        assert_eq!(slice_json_array("x [1, 2] y"), Some("[1, 2]"));
        assert_eq!(slice_json_array("[]"), Some("[]"));
        assert_eq!(slice_json_array("no brackets"), None);
        assert_eq!(slice_json_array("only ["), None);
        assert_eq!(slice_json_array("] then ["), None);
    }

    #[test]
    fn fenced_content_parses_unchanged_in_meaning() {
        let inner = r#"[{"step_number": 1, "title": "Cut", "materials_needed": ["scissors"]}]"#;
        let raw = format!("```json\n{inner}\n```");
        let expected: serde_json::Value = serde_json::from_str(inner).unwrap();
        let actual: serde_json::Value = serde_json::from_str(&normalize(&raw)).unwrap();
        assert_eq!(actual, expected);
    }
}
