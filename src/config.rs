use serde::{Deserialize, Serialize};

/// Behaviour switches for an IndexSet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptions {
    /// Deliver `UnableToUseIndex` to registered listeners on fallback scans.
    pub notify_on_fallback: bool,
    /// Emit a `tracing` debug event on fallback scans.
    pub log_fallback: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self { notify_on_fallback: true, log_fallback: true }
    }
}

impl SetOptions {
    /// No listeners called, nothing logged on fallback.
    pub const fn quiet() -> Self {
        Self { notify_on_fallback: false, log_fallback: false }
    }
}
