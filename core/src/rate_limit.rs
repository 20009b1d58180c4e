//! Reactive cooldown driven by ShipStation's rate-limit headers.
//!
//! ShipStation reports `X-Rate-Limit-Remaining` (requests left in the current
//! window) and `X-Rate-Limit-Reset` (seconds until the window resets) on every
//! response. When the window would take more than 1.5 seconds per remaining
//! request to drain, the client pauses once for a fixed cooldown.

use std::time::Duration;

use crate::http::HttpResponse;

pub const REMAINING_HEADER: &str = "X-Rate-Limit-Remaining";
pub const RESET_HEADER: &str = "X-Rate-Limit-Reset";

/// `reset / remaining` above this triggers a pause.
pub const PAUSE_RATIO: f64 = 1.5;

/// Fixed pause applied when the ratio is exceeded.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1500);

/// Rate-limit state read from a single response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    pub remaining: f64,
    pub reset: f64,
}

impl RateLimit {
    /// Read both headers. Returns `None` when either is absent or not numeric.
    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        let remaining = parse_header(response, REMAINING_HEADER)?;
        let reset = parse_header(response, RESET_HEADER)?;
        Some(Self { remaining, reset })
    }

    /// Zero (or negative) remaining always pauses instead of dividing by zero.
    pub fn should_pause(&self) -> bool {
        if self.remaining <= 0.0 {
            return true;
        }
        self.reset / self.remaining > PAUSE_RATIO
    }
}

fn parse_header(response: &HttpResponse, name: &str) -> Option<f64> {
    response
        .header(name)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
