//! rh-render: the offline block-rendering orchestrator
//!
//! Ties together the multi-file reader, the automation engine, a hosted
//! plugin, and the output writer into one sample-accurate rendering pass:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Renderer                             │
//! │                                                              │
//! │  ┌────────────┐   ┌────────────┐   ┌────────┐   ┌─────────┐ │
//! │  │ MultiReader│ → │ Automation │ → │ Plugin │ → │  Sink   │ │
//! │  │ (N inputs) │   │ values_at  │   │ process│   │ (WAV)   │ │
//! │  └────────────┘   └────────────┘   └────────┘   └─────────┘ │
//! │                                                              │
//! │  Configuring → Rendering → Draining → Finished / Failed      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop is single-threaded and synchronous; block N+1 never starts
//! before block N's write has completed. A per-block plugin failure is
//! logged and skipped; a short write aborts the render.

mod config;
mod error;
mod renderer;
mod session;

pub use config::*;
pub use error::*;
pub use renderer::*;
pub use session::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
