//! `{name}` placeholder substitution for endpoint paths.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Text substituted for a placeholder whose field is missing from the record.
pub const ABSENT: &str = "undefined";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("invalid placeholder regex"));

/// Substitute every `{name}` token in `template` with `data[name]`.
///
/// Placeholder names are collected left to right from the template first.
/// Each one then replaces the first remaining occurrence of its token in the
/// partially rendered string, so a repeated token is consumed once per
/// appearance. Missing fields render as [`ABSENT`], as does every field when
/// `data` is not an object.
pub fn render(template: &str, data: &Value) -> String {
    let names: Vec<&str> = PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    let mut rendered = template.to_string();
    for name in names {
        let token = format!("{{{name}}}");
        let value = data.get(name).map_or_else(|| ABSENT.to_string(), display_value);
        rendered = rendered.replacen(&token, &value, 1);
    }
    rendered
}

/// Loose string form of a JSON value, as it would appear inside a URL.
///
/// Strings are inserted verbatim, integral floats drop their fraction,
/// arrays join their elements with commas and objects collapse to
/// `[object Object]`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e21 => {
                format!("{f:.0}")
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn substitutes_every_placeholder() {
        let data = json!({"id": 7, "postId": 12});
        assert_eq!(render("/users/{id}/posts/{postId}", &data), "/users/7/posts/12");
    }

    #[test]
    fn missing_field_renders_absent_marker() {
        assert_eq!(render("/users/{id}", &json!({})), "/users/undefined");
    }

    #[test]
    fn non_object_data_has_no_fields() {
        assert_eq!(render("/users/{id}", &Value::Null), "/users/undefined");
        assert_eq!(render("/users/{len}", &json!("abc")), "/users/undefined");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let data = json!({"id": 1});
        assert_eq!(render("/users", &data), "/users");
        assert_eq!(render("", &data), "");
    }

    #[test]
    fn repeated_placeholder_is_replaced_each_time() {
        let data = json!({"id": "a"});
        assert_eq!(render("/{id}/copy/{id}", &data), "/a/copy/a");
    }

    #[test]
    fn stray_and_empty_braces_are_left_alone() {
        let data = json!({"id": 3});
        assert_eq!(render("/a}/{}/{id}", &data), "/a}/{}/3");
        assert_eq!(render("/{{id}}", &data), "/{3}");
    }

    #[test]
    fn rendering_is_a_no_op_on_rendered_output() {
        let data = json!({"id": 9});
        let once = render("/users/{id}", &data);
        assert_eq!(render(&once, &data), once);
    }

    #[test]
    fn later_names_consume_braces_injected_earlier() {
        let data = json!({"a": "{b}", "b": "x"});
        // `{b}` injected by `a` is consumed before the template's own `{b}`.
        assert_eq!(render("/{a}/{b}", &data), "/x/{b}");
    }

    #[test]
    fn display_value_matches_loose_string_conversion() {
        assert_eq!(display_value(&json!(null)), "null");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(-3)), "-3");
        assert_eq!(display_value(&json!(5.0)), "5");
        assert_eq!(display_value(&json!(2.5)), "2.5");
        assert_eq!(display_value(&json!("a b")), "a b");
        assert_eq!(display_value(&json!([1, null, "x"])), "1,,x");
        assert_eq!(display_value(&json!({"k": 1})), "[object Object]");
    }
}
