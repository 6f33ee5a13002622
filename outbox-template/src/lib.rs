//! Email templates with pure `{{name}}` substitution
//!
//! The renderer is deliberately not a template engine: a template is three
//! strings (subject, HTML body, optional text body) and rendering is plain
//! placeholder replacement. No conditionals, no loops, no escaping layers.
//! Missing variables substitute the empty string rather than failing, so an
//! incomplete variable bag degrades to a blank field instead of a stuck
//! task; callers that care can validate against
//! [`Template::required_variables`] up front.

pub mod error;
pub mod registry;
pub mod template;

pub use error::{RenderError, Result};
pub use registry::TemplateRegistry;
pub use template::{RenderedEmail, Template, Variables};
