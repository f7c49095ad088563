//! Recording terminal backend for tests.

use crate::color::ColorSupport;
use crate::error::Result;

use super::Terminal;

/// A terminal that records every frame written to it.
#[derive(Clone, Debug)]
pub struct TestBackend {
    columns: u16,
    frames: Vec<String>,
    target: Option<u64>,
}

impl TestBackend {
    /// Create a backend with the given column count.
    pub fn new(columns: u16) -> Self {
        Self {
            columns,
            frames: Vec::new(),
            target: None,
        }
    }

    /// Give the backend a stream identity for registry tests.
    #[must_use]
    pub fn with_target(mut self, id: u64) -> Self {
        self.target = Some(id);
        self
    }

    /// Change the reported column count (simulates a resize).
    pub fn set_columns(&mut self, columns: u16) {
        self.columns = columns;
    }

    /// Every frame written so far, in order.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Number of frames written.
    pub fn write_count(&self) -> usize {
        self.frames.len()
    }

    /// Concatenated output of every write.
    pub fn output(&self) -> String {
        self.frames.concat()
    }

    /// The most recent frame, if any.
    pub fn last_frame(&self) -> Option<&str> {
        self.frames.last().map(String::as_str)
    }
}

impl Terminal for TestBackend {
    fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.frames.push(frame.to_string());
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.columns
    }

    fn color_support(&self) -> ColorSupport {
        // Deterministic regardless of the test environment.
        ColorSupport::TrueColor
    }

    fn is_interactive(&self) -> bool {
        false
    }

    fn target_id(&self) -> Option<u64> {
        self.target
    }
}
