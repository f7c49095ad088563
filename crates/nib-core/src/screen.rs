//! Frame driver.
//!
//! Owns the root node and the output terminal. Coalesces reconciler
//! commits through the rate limiter, diffs frames against the previous
//! emission, and patches the terminal in place with cursor and erase
//! sequences. Static content is written above the dynamic region and
//! never erased once emitted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use crate::color::ColorSupport;
use crate::compositor;
use crate::error::Result;
use crate::node::{NodeId, Tree};
use crate::reconciler::{Reconciler, RenderSink};
use crate::style::{FlexDirection, Style};
use crate::terminal::Terminal;
use crate::throttle::Throttle;

/// A mounted frame driver: the reconciler plus the terminal sink.
pub type Screen<T> = Reconciler<FrameSink<T>>;

/// Driver construction options.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScreenOptions {
    /// Disable the repaint rate limiter (every render paints).
    pub debug: bool,
}

/// Process-wide table from terminal target id to the owning screen
/// instance. Mutated only during mount/unmount; a screen whose slot was
/// taken over stops writing.
fn registry() -> &'static Mutex<HashMap<u64, u64>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, u64>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// The driver-side render sink: terminal, frame cache, and rate limiter.
pub struct FrameSink<T: Terminal> {
    term: T,
    columns: u16,
    color: ColorSupport,
    throttle: Throttle,
    debug: bool,
    last_output: Option<String>,
    last_height: usize,
    instance: u64,
    active: bool,
}

impl<T: Terminal> FrameSink<T> {
    fn new(term: T, options: ScreenOptions) -> Self {
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        if let Some(target) = term.target_id()
            && let Ok(mut map) = registry().lock()
        {
            // Attaching to a stream displaces any previous driver.
            map.insert(target, instance);
        }
        let columns = term.columns();
        let color = term.color_support();
        Self {
            term,
            columns,
            color,
            throttle: Throttle::default(),
            debug: options.debug,
            last_output: None,
            last_height: 0,
            instance,
            active: true,
        }
    }

    /// Whether this driver still owns its stream.
    fn owns_stream(&self) -> bool {
        let Some(target) = self.term.target_id() else {
            return true;
        };
        registry()
            .lock()
            .map(|map| map.get(&target) == Some(&self.instance))
            .unwrap_or(false)
    }

    fn unregister(&mut self) {
        if let Some(target) = self.term.target_id()
            && let Ok(mut map) = registry().lock()
            && map.get(&target) == Some(&self.instance)
        {
            map.remove(&target);
        }
    }

    /// Compose and write one frame.
    ///
    /// Identical output is skipped entirely; otherwise the previously
    /// painted region is erased in place, new static rows are emitted
    /// above the dynamic region, and the frame goes out as one
    /// contiguous write.
    fn paint(&mut self, tree: &mut Tree, root: NodeId) -> Result<()> {
        if !self.active || !self.owns_stream() {
            return Ok(());
        }

        let frame = compositor::render_frame(tree, root, self.color)?;
        let has_static = frame.has_static();
        if !has_static && self.last_output.as_deref() == Some(frame.output.as_str()) {
            return Ok(());
        }

        let mut buf = erase_lines(self.last_height);
        if has_static {
            buf.push_str(&frame.static_output);
            buf.push('\n');
        }
        if frame.height > 0 {
            buf.push_str(&frame.output);
            buf.push('\n');
        }
        if buf.is_empty() {
            self.last_output = Some(frame.output);
            self.last_height = frame.height;
            return Ok(());
        }

        tracing::trace!(bytes = buf.len(), height = frame.height, "painting frame");
        if let Err(err) = self.term.write_frame(&buf) {
            // Stream write failures are fatal: deactivate the driver.
            self.active = false;
            self.unregister();
            return Err(err);
        }

        self.last_output = Some(frame.output);
        self.last_height = frame.height;
        Ok(())
    }
}

impl<T: Terminal> RenderSink for FrameSink<T> {
    fn compute_layout(&mut self, tree: &mut Tree, root: NodeId) -> Result<()> {
        tree.set_style(
            root,
            Style::new()
                .width(self.columns)
                .flex_direction(FlexDirection::Column),
        )?;
        tree.compute_layout(root, self.columns)
    }

    fn render(&mut self, tree: &mut Tree, root: NodeId) -> Result<()> {
        if self.debug || self.throttle.acquire(Instant::now()) {
            self.paint(tree, root)
        } else {
            Ok(())
        }
    }

    fn immediate_render(&mut self, tree: &mut Tree, root: NodeId) -> Result<()> {
        self.paint(tree, root)
    }
}

impl<T: Terminal> Reconciler<FrameSink<T>> {
    /// Mount a driver on a terminal. At most one driver is active per
    /// output stream; mounting displaces any previous driver on the same
    /// stream.
    pub fn mount(term: T) -> Result<Self> {
        Self::mount_with(term, ScreenOptions::default())
    }

    /// Mount with explicit options.
    pub fn mount_with(term: T, options: ScreenOptions) -> Result<Self> {
        Reconciler::new(FrameSink::new(term, options))
    }

    /// Current column count the driver lays out against.
    pub fn columns(&self) -> u16 {
        self.sink().columns
    }

    /// Borrow the terminal backend.
    pub fn terminal(&self) -> &T {
        &self.sink().term
    }

    /// Fire a due trailing-edge repaint. The runtime is cooperative:
    /// hosts call this when their event loop is otherwise idle.
    pub fn tick(&mut self) -> Result<()> {
        let (tree, root, sink) = self.parts();
        if sink.throttle.take_trailing(Instant::now()) {
            sink.paint(tree, root)
        } else {
            Ok(())
        }
    }

    /// Re-query the terminal size and repaint on change. No-op for
    /// non-interactive streams.
    pub fn poll_resize(&mut self) -> Result<()> {
        if !self.sink().term.is_interactive() {
            return Ok(());
        }
        let columns = self.sink().term.columns();
        if columns != self.sink().columns {
            self.resize(columns)?;
        }
        Ok(())
    }

    /// Apply a new column count: invalidate the last-frame cache, re-run
    /// layout, and repaint in full. Ignored after unmount.
    pub fn resize(&mut self, columns: u16) -> Result<()> {
        let (tree, root, sink) = self.parts();
        if !sink.active {
            return Ok(());
        }
        tracing::debug!(columns, "stream resized");
        sink.columns = columns;
        sink.last_output = None;
        sink.compute_layout(tree, root)?;
        sink.render(tree, root)
    }

    /// Unmount the driver: flush a final frame, cancel pending repaints,
    /// free the layout tree, and release the stream.
    pub fn unmount(&mut self) -> Result<()> {
        let (tree, root, sink) = self.parts();
        let flushed = if sink.active {
            sink.paint(tree, root)
        } else {
            Ok(())
        };
        sink.throttle.cancel();
        sink.active = false;
        sink.unregister();
        tree.clear()?;
        flushed
    }
}

/// Erase the previously painted region in place: cursor up to its top,
/// erase-line and cursor-down per line, then cursor up back to the top.
fn erase_lines(count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    let mut out = format!("\x1b[{count}A");
    for _ in 0..count {
        out.push_str("\x1b[2K\x1b[1B");
    }
    out.push_str(&format!("\x1b[{count}A"));
    out
}
