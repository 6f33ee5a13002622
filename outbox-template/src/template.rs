//! A single template and the substitution pass

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Variable bag handed to the renderer
pub type Variables = AHashMap<String, String>;

/// One registered email template
///
/// Placeholders look like `{{name}}`; whitespace inside the braces is
/// allowed (`{{ name }}`). Anything that does not close is left verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Subject line, may contain placeholders
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Optional plain-text body
    pub text: Option<String>,
}

/// The three rendered parts of an outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

impl Template {
    /// Create a template with subject and HTML body
    #[must_use]
    pub fn new(subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            text: None,
        }
    }

    /// Add a plain-text body
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Render all three parts against `variables`
    #[must_use]
    pub fn render(&self, variables: &Variables) -> RenderedEmail {
        RenderedEmail {
            subject: substitute(&self.subject, variables),
            html: substitute(&self.html, variables),
            text: self.text.as_deref().map(|t| substitute(t, variables)),
        }
    }

    /// The fixed, enumerable set of variable names this template references
    ///
    /// Collected from every placeholder across subject, HTML, and text
    /// parts; sorted and deduplicated. Useful for validating a variable bag
    /// before enqueueing.
    #[must_use]
    pub fn required_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = [
            Some(self.subject.as_str()),
            Some(self.html.as_str()),
            self.text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .flat_map(placeholder_names)
        .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Replace every `{{name}}` in `input` with its value from `variables`
///
/// Unknown names substitute the empty string. An unterminated `{{` is
/// emitted as-is.
fn substitute(input: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            // No closing braces anywhere ahead: keep the tail verbatim
            out.push_str(&rest[open..]);
            return out;
        };

        let name = after_open[..close].trim();
        if let Some(value) = variables.get(name) {
            out.push_str(value);
        }
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    out
}

/// Collect the placeholder names appearing in `input`, in order
fn placeholder_names(input: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let name = after_open[..close].trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &after_open[close + 2..];
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_basic_substitution() {
        let result = substitute(
            "Hello {{name}}, welcome to {{site}}!",
            &vars(&[("name", "Ada"), ("site", "example.com")]),
        );
        assert_eq!(result, "Hello Ada, welcome to example.com!");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let result = substitute("Hello {{name}}!", &Variables::new());
        assert_eq!(result, "Hello !");
    }

    #[test]
    fn test_whitespace_inside_braces() {
        let result = substitute("{{ name }}", &vars(&[("name", "Ada")]));
        assert_eq!(result, "Ada");
    }

    #[test]
    fn test_unterminated_placeholder_kept_verbatim() {
        let result = substitute("Hello {{name", &vars(&[("name", "Ada")]));
        assert_eq!(result, "Hello {{name");
    }

    #[test]
    fn test_repeated_placeholder() {
        let result = substitute("{{x}} and {{x}}", &vars(&[("x", "1")]));
        assert_eq!(result, "1 and 1");
    }

    #[test]
    fn test_no_placeholders_passthrough() {
        let result = substitute("plain text", &vars(&[("name", "Ada")]));
        assert_eq!(result, "plain text");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = Template::new("Hi {{name}}", "<p>Hi {{name}}</p>")
            .with_text("Hi {{name}}");
        let variables = vars(&[("name", "Ada")]);

        let first = template.render(&variables);
        let second = template.render(&variables);
        assert_eq!(first, second);
        assert_eq!(first.subject, "Hi Ada");
        assert_eq!(first.html, "<p>Hi Ada</p>");
        assert_eq!(first.text.as_deref(), Some("Hi Ada"));
    }

    #[test]
    fn test_required_variables_across_parts() {
        let template = Template::new("{{subject_tag}} {{name}}", "<p>{{name}} {{body}}</p>")
            .with_text("{{name}} {{footer}}");
        assert_eq!(
            template.required_variables(),
            vec!["body", "footer", "name", "subject_tag"]
        );
    }
}
