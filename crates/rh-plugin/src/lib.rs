//! rh-plugin: the plugin capability seam
//!
//! The orchestrator drives an already-instantiated plugin through the
//! `PluginInstance` trait; it never loads or constructs one. The built-in
//! instances here give the CLI and the render tests something to host
//! without an external plugin ABI.

mod builtin;
mod error;
mod events;
mod instance;

pub use builtin::*;
pub use error::*;
pub use events::*;
pub use instance::*;
