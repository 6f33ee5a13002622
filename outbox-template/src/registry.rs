//! Registry of templates keyed by id

use ahash::AHashMap;
use serde::Deserialize;

use crate::{
    RenderError,
    template::{RenderedEmail, Template, Variables},
};

/// Holds every template known to the queue, keyed by id
///
/// Registered once at startup (or deserialized from configuration) and then
/// only read; cloning is cheap enough for the handful of templates a mail
/// queue carries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TemplateRegistry {
    templates: AHashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under `id`, replacing any previous registration
    pub fn register(&mut self, id: impl Into<String>, template: Template) {
        self.templates.insert(id.into(), template);
    }

    /// Look up a template by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// Whether a template is registered under `id`
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Number of registered templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Render all parts of the template registered under `id`
    ///
    /// # Errors
    /// `RenderError::UnknownTemplate` if no template has this id.
    pub fn render(&self, id: &str, variables: &Variables) -> crate::Result<RenderedEmail> {
        self.lookup(id).map(|t| t.render(variables))
    }

    /// Render only the subject line
    ///
    /// # Errors
    /// `RenderError::UnknownTemplate` if no template has this id.
    pub fn render_subject(&self, id: &str, variables: &Variables) -> crate::Result<String> {
        self.render(id, variables).map(|r| r.subject)
    }

    /// Render only the HTML body
    ///
    /// # Errors
    /// `RenderError::UnknownTemplate` if no template has this id.
    pub fn render_html(&self, id: &str, variables: &Variables) -> crate::Result<String> {
        self.render(id, variables).map(|r| r.html)
    }

    /// Render only the plain-text body, if the template has one
    ///
    /// # Errors
    /// `RenderError::UnknownTemplate` if no template has this id.
    pub fn render_text(&self, id: &str, variables: &Variables) -> crate::Result<Option<String>> {
        self.render(id, variables).map(|r| r.text)
    }

    /// The variable names the template registered under `id` references
    ///
    /// # Errors
    /// `RenderError::UnknownTemplate` if no template has this id.
    pub fn required_variables(&self, id: &str) -> crate::Result<Vec<String>> {
        self.lookup(id).map(Template::required_variables)
    }

    fn lookup(&self, id: &str) -> crate::Result<&Template> {
        self.templates
            .get(id)
            .ok_or_else(|| RenderError::UnknownTemplate(id.to_string()))
    }
}
