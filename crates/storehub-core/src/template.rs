//! # Template Rendering
//!
//! Fills `{{ key }}` placeholders in notification templates.
//!
//! ## Algorithm
//! A single left-to-right scan. Each `{{ ... }}` is trimmed and looked up in
//! the variables map. Substituted values are never rescanned, so a value
//! containing `{{x}}` is emitted literally. An unterminated `{{` is copied
//! through as text.
//!
//! ```rust
//! use std::collections::HashMap;
//! use storehub_core::template::{render, Escape};
//!
//! let vars = HashMap::from([("name".to_string(), "Sam".to_string())]);
//! let out = render("Hi {{ name }}, {{ missing }}!", &vars, Escape::None);
//! assert_eq!(out.text, "Hi Sam, !");
//! assert_eq!(out.missing, vec!["missing".to_string()]);
//! ```

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Escaping applied to substituted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    None,
    Html,
}

/// Output of a single render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Placeholder names with no value, in order of first appearance.
    pub missing: Vec<String>,
}

/// Renders one template string.
pub fn render(template: &str, vars: &HashMap<String, String>, escape: Escape) -> Rendered {
    let mut text = String::with_capacity(template.len());
    let mut missing: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        text.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            text.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let key = after_open[..end].trim();
        match vars.get(key) {
            Some(value) => match escape {
                Escape::None => text.push_str(value),
                Escape::Html => push_html_escaped(&mut text, value),
            },
            None => {
                if !missing.iter().any(|m| m == key) {
                    missing.push(key.to_string());
                }
            }
        }

        rest = &after_open[end + 2..];
    }
    text.push_str(rest);

    Rendered { text, missing }
}

fn push_html_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// A fully rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    /// Every placeholder left blank across subject and bodies, sorted.
    pub missing_variables: Vec<String>,
}

/// Renders subject, HTML body and optional text body together.
///
/// Values are HTML-escaped only in the HTML body.
pub fn render_email(
    subject: &str,
    html_body: &str,
    text_body: Option<&str>,
    vars: &HashMap<String, String>,
) -> RenderedEmail {
    let subject = render(subject, vars, Escape::None);
    let html = render(html_body, vars, Escape::Html);
    let text = text_body.map(|t| render(t, vars, Escape::None));

    let mut missing: BTreeSet<String> = BTreeSet::new();
    missing.extend(subject.missing);
    missing.extend(html.missing);
    if let Some(t) = &text {
        missing.extend(t.missing.iter().cloned());
    }

    RenderedEmail {
        subject: subject.text,
        html_body: html.text,
        text_body: text.map(|t| t.text),
        missing_variables: missing.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_with_and_without_spaces() {
        let v = vars(&[("sku", "COKE-330"), ("qty", "3")]);
        let out = render("{{sku}} has {{ qty }} left", &v, Escape::None);
        assert_eq!(out.text, "COKE-330 has 3 left");
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_missing_reported_once() {
        let out = render("{{a}}-{{ a }}-{{b}}", &HashMap::new(), Escape::None);
        assert_eq!(out.text, "--");
        assert_eq!(out.missing, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let v = vars(&[("x", "{{y}}"), ("y", "boom")]);
        let out = render("{{x}}", &v, Escape::None);
        assert_eq!(out.text, "{{y}}");
    }

    #[test]
    fn test_unterminated_placeholder_is_literal() {
        let out = render("Total: {{ total", &HashMap::new(), Escape::None);
        assert_eq!(out.text, "Total: {{ total");
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_html_escaping() {
        let v = vars(&[("name", "<b>Tom & \"Jerry\"</b>")]);
        let out = render("<p>{{name}}</p>", &v, Escape::Html);
        assert_eq!(out.text, "<p>&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;</p>");
    }

    #[test]
    fn test_render_email_escapes_only_html() {
        let v = vars(&[("item", "Fish & Chips")]);
        let email = render_email(
            "Low stock: {{item}}",
            "<p>{{item}} {{extra}}</p>",
            Some("{{item}}"),
            &v,
        );

        assert_eq!(email.subject, "Low stock: Fish & Chips");
        assert_eq!(email.html_body, "<p>Fish &amp; Chips </p>");
        assert_eq!(email.text_body.as_deref(), Some("Fish & Chips"));
        assert_eq!(email.missing_variables, vec!["extra".to_string()]);
    }
}
