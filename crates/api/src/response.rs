//! API response types.

use serde::Serialize;

/// Generic `{"success": true}` body.
#[derive(Debug, Serialize)]
pub struct Success {
    /// Always `true`; failures are reported as `{"error": ...}` instead.
    pub success: bool,
}

impl Success {
    /// Create a success body.
    #[must_use]
    pub const fn new() -> Self {
        Self { success: true }
    }
}

impl Default for Success {
    fn default() -> Self {
        Self::new()
    }
}
