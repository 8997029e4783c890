//! File bodies written by the scaffold stages and `dbuddy generate`
//!
//! Templates are plain strings with `{{placeholder}}` markers, filled in by
//! [`render`]. Which files a project gets is decided by the stages; this
//! module only knows what goes in them.

pub mod base;
pub mod ci;
pub mod docker;
pub mod generate;
pub mod testing;

use crate::project::ProjectSpec;

/// A file to write, relative to the project directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub path: String,
    pub contents: String,
}

impl TemplateFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Replace each `{{key}}` in `template` with its value
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

/// Placeholders every project template may use
pub(crate) fn project_vars(spec: &ProjectSpec) -> [(&str, String); 4] {
    [
        ("name", spec.name().to_string()),
        ("ident", spec.identifier()),
        ("kind", spec.kind().display_name().to_string()),
        ("run", spec.kind().run_hint().to_string()),
    ]
}

pub(crate) fn render_project(template: &str, spec: &ProjectSpec) -> String {
    let vars = project_vars(spec);
    let borrowed: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    render(template, &borrowed)
}
