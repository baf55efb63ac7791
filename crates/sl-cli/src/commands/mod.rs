//! CLI command implementations

pub(crate) mod common;
pub(crate) mod init;
pub(crate) mod plan;
pub(crate) mod run;
#[cfg(feature = "serve")]
pub(crate) mod serve;
pub(crate) mod status;
