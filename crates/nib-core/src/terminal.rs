//! Terminal abstraction for the frame driver.
//!
//! A [`Terminal`] receives whole frames as single contiguous writes and
//! reports its column count and interactivity. The crossterm-backed
//! implementation drives a real tty; the test backend records every
//! frame for assertions.

pub mod crossterm_backend;
pub mod test_backend;

pub use crossterm_backend::CrosstermBackend;
pub use test_backend::TestBackend;

use crate::color::ColorSupport;
use crate::error::Result;

/// Default column count when neither the stream nor the environment
/// reports a width.
pub const DEFAULT_COLUMNS: u16 = 80;

/// Output stream contract of the frame driver.
pub trait Terminal {
    /// Write one frame as a single contiguous buffer and flush.
    fn write_frame(&mut self, frame: &str) -> Result<()>;

    /// Current column count.
    fn columns(&self) -> u16;

    /// Color capability of the stream. Defaults to the environment probe.
    fn color_support(&self) -> ColorSupport {
        ColorSupport::detect()
    }

    /// Whether the stream is an interactive tty (resize events and
    /// in-place updates make sense).
    fn is_interactive(&self) -> bool;

    /// Stable identity of the underlying stream, for the per-stream
    /// driver registry. `None` opts out of uniqueness tracking.
    fn target_id(&self) -> Option<u64> {
        None
    }
}

/// Read the column count from the `COLUMNS` environment variable.
pub(crate) fn columns_from_env() -> Option<u16> {
    std::env::var("COLUMNS").ok()?.trim().parse().ok()
}
