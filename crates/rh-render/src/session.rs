//! Render session state, progress reporting, and the processing gate

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Render session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderState {
    Configuring,
    Rendering,
    Draining,
    Finished,
    Failed,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::Configuring
    }
}

/// Summary of a completed (or aborted) render
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub state: RenderState,
    pub frames_processed: u64,
    pub blocks_processed: u64,
    pub elapsed: Duration,
    /// Rendered seconds per wall-clock second
    pub realtime_factor: f64,
}

/// Atomic "processing enabled" gate around plugin invocation
///
/// Plugin instances are not reentrant. The offline loop checks this gate
/// before each plugin invocation; a callback-driven renderer sharing the
/// block primitive must check the same gate so a stop request from another
/// thread cannot race an invocation already in flight.
#[derive(Debug, Default)]
pub struct ProcessGate {
    enabled: AtomicBool,
}

impl ProcessGate {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

static INIT: Once = Once::new();

/// One-time process-wide initialization of the rendering subsystem.
///
/// Idempotent; the renderer calls this on entry. A device-driven path added
/// on top of the block primitive performs its audio-backend setup here.
pub fn ensure_initialized() {
    INIT.call_once(|| {
        log::debug!("render subsystem initialized");
    });
}
