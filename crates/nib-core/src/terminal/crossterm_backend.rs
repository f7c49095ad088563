//! Stdout terminal backend.

use std::io::{self, Write};

use crossterm::tty::IsTty;

use crate::error::Result;

use super::{DEFAULT_COLUMNS, Terminal, columns_from_env};

/// Terminal backend writing to the process stdout.
///
/// Interactive streams query the live terminal size; non-interactive
/// streams take the column count once from `COLUMNS` at construction,
/// defaulting to 80.
pub struct CrosstermBackend {
    stdout: io::Stdout,
    interactive: bool,
    fixed_columns: u16,
}

impl CrosstermBackend {
    /// Create a backend on the process stdout.
    pub fn stdout() -> Self {
        let stdout = io::stdout();
        let interactive = stdout.is_tty();
        let fixed_columns = columns_from_env().unwrap_or(DEFAULT_COLUMNS);
        Self {
            stdout,
            interactive,
            fixed_columns,
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Terminal for CrosstermBackend {
    fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.stdout.write_all(frame.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    fn columns(&self) -> u16 {
        if self.interactive
            && let Ok((cols, _rows)) = crossterm::terminal::size()
        {
            return cols;
        }
        self.fixed_columns
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn target_id(&self) -> Option<u64> {
        // One well-known id per process stdout.
        Some(1)
    }
}
