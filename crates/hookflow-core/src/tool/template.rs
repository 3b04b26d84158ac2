//! Minimal `{{key}}` template rendering.

use serde_json::{Map, Value};

/// Replace `{{key}}` (or `{{ key }}`) with the matching value from `vars`.
///
/// Strings are inserted raw, other values as compact JSON. Unknown keys and
/// unterminated placeholders are left in place.
pub fn render(template: &str, vars: &Map<String, Value>) -> String {
    render_with(template, vars, |out, s| out.push_str(s))
}

/// Like [`render`], but strings are JSON-escaped so that a placeholder
/// inside a quoted JSON string keeps the document valid.
pub fn render_json(template: &str, vars: &Map<String, Value>) -> String {
    render_with(template, vars, |out, s| {
        let quoted = Value::String(s.to_string()).to_string();
        out.push_str(&quoted[1..quoted.len() - 1]);
    })
}

fn render_with(template: &str, vars: &Map<String, Value>, push_str: impl Fn(&mut String, &str)) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after[..end].trim();
        match vars.get(key) {
            Some(Value::String(s)) => push_str(&mut out, s.as_str()),
            Some(other) => out.push_str(&other.to_string()),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_render_substitutes_values() {
        let v = vars(json!({"name": "Ada", "count": 3, "tags": ["a"]}));
        assert_eq!(render("Hi {{name}}, {{ count }} new", &v), "Hi Ada, 3 new");
        assert_eq!(render("{{tags}}", &v), r#"["a"]"#);
    }

    #[test]
    fn test_render_keeps_unknown_and_unterminated() {
        let v = vars(json!({"name": "Ada"}));
        assert_eq!(render("{{who}} and {{name}}", &v), "{{who}} and Ada");
        assert_eq!(render("oops {{name", &v), "oops {{name");
        assert_eq!(render("plain", &v), "plain");
    }

    #[test]
    fn test_render_json_escapes_strings() {
        let v = vars(json!({"note": "a\"b\\c\nd", "n": 2}));
        let body = render_json(r#"{"note": "{{note}}", "n": {{n}}}"#, &v);
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, json!({"note": "a\"b\\c\nd", "n": 2}));
        assert_eq!(render("{{note}}", &v), "a\"b\\c\nd");
    }
}
