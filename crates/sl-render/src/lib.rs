//! sl-render - Maintenance page rendering for Sluice
//!
//! Templates live in `templates/` and are compiled into the binary. The
//! renderer exposes one method per update page; callers pass the typed views
//! from [`views`].

pub mod error;
pub mod renderer;
pub mod views;

pub use error::{RenderError, RenderResult};
pub use renderer::{
    PageRenderer, TITLE_ACCESS_DENIED, TITLE_ERROR, TITLE_UPDATE, TITLE_UPDATING,
};
pub use views::{
    FinishedView, ModuleReport, ModuleSelection, ProgressView, VersionOption, VersionReport,
};
