//! Maintenance page renderer backed by embedded templates

use crate::error::RenderResult;
use crate::views::{FinishedView, ModuleSelection, ProgressView};
use minijinja::{context, Environment, Value};
use rust_embed::Embed;

/// Title of the info, selection and finished pages
pub const TITLE_UPDATE: &str = "Database update";

/// Title of the progress pages
pub const TITLE_UPDATING: &str = "Updating";

/// Title of the access denied page
pub const TITLE_ACCESS_DENIED: &str = "Access denied";

/// Title of the error message page
pub const TITLE_ERROR: &str = "Error";

/// Templates compiled into the binary from `templates/`
#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

/// Renders the update pages.
///
/// Every page extends `maintenance.html`, which owns the document head, the
/// optional meta refresh and the polling script tag.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer {
    /// Create a renderer over the embedded templates
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| match Templates::get(name) {
            Some(file) => String::from_utf8(file.data.into_owned())
                .map(Some)
                .map_err(|e| {
                    minijinja::Error::new(
                        minijinja::ErrorKind::InvalidOperation,
                        format!("template '{}' is not valid UTF-8", name),
                    )
                    .with_source(e)
                }),
            None => Ok(None),
        });
        Self { env }
    }

    /// Landing page with instructions and a link to the selection form
    pub fn info(&self) -> RenderResult<String> {
        self.render("info.html", context! { title => TITLE_UPDATE })
    }

    /// Version selection form
    pub fn selection(&self, modules: &[ModuleSelection]) -> RenderResult<String> {
        self.render(
            "selection.html",
            context! { title => TITLE_UPDATE, modules => modules, script => true },
        )
    }

    /// Progress page for the polling script
    pub fn progress(&self, view: &ProgressView) -> RenderResult<String> {
        self.render(
            "progress.html",
            context! { title => TITLE_UPDATING, progress => view, script => true },
        )
    }

    /// Progress page that reloads itself through a meta refresh
    pub fn progress_nojs(&self, view: &ProgressView, refresh: &str) -> RenderResult<String> {
        self.render(
            "progress_nojs.html",
            context! { title => TITLE_UPDATING, progress => view, refresh => refresh },
        )
    }

    /// Report of every executed statement
    pub fn finished(&self, view: &FinishedView) -> RenderResult<String> {
        self.render("finished.html", context! { title => TITLE_UPDATE, report => view })
    }

    /// Page shown to callers that fail the access check
    pub fn access_denied(&self) -> RenderResult<String> {
        self.render("access_denied.html", context! { title => TITLE_ACCESS_DENIED })
    }

    /// Error message page
    pub fn error(&self, message: &str) -> RenderResult<String> {
        self.render("error.html", context! { title => TITLE_ERROR, message => message })
    }

    fn render(&self, name: &str, ctx: Value) -> RenderResult<String> {
        log::debug!("Rendering {}", name);
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}

#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;
