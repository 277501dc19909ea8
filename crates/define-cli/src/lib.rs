//! Library side of the `define-editor` command-line host.

pub mod commands;
pub mod logging;
pub mod settings;
pub mod summary;
