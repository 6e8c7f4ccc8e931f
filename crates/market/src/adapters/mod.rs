pub mod binance;
pub mod indodax;
pub mod interval;

pub use binance::BinanceAdapter;
pub use indodax::IndodaxAdapter;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use common::RateLimitInfo;

/// Minute-window request counter backing each adapter's rate-limit report.
#[derive(Debug)]
pub(crate) struct RequestCounter {
    per_minute: u32,
    window: Mutex<(Instant, u32)>,
}

impl RequestCounter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            window: Mutex::new((Instant::now(), 0)),
        }
    }

    /// Count one outgoing request, resetting the window after a minute.
    pub fn record(&self) {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.0.elapsed() >= Duration::from_secs(60) {
            *window = (Instant::now(), 0);
        }
        window.1 += 1;
    }

    pub fn info(&self) -> RateLimitInfo {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        let used = if window.0.elapsed() >= Duration::from_secs(60) {
            0
        } else {
            window.1
        };
        RateLimitInfo {
            requests_per_minute: self.per_minute,
            requests_remaining: self.per_minute.saturating_sub(used),
        }
    }
}
