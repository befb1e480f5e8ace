// ABOUTME: Response multiplexer shared by all per-foundation workers.
// ABOUTME: Serializes interleaved worker output onto the caller's single stream.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Multiplexes output from many concurrent workers onto one response stream.
///
/// Each worker writes through its own [`OutputHandle`]. A single `write` call
/// is forwarded under one lock acquisition, so a worker's write lands
/// contiguously on the combined stream. Writes from one handle appear in the
/// order they were made; interleaving between handles is unordered.
pub struct OutputMux {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputMux {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Create a write handle for one worker.
    pub fn handle(&self) -> OutputHandle {
        OutputHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A worker's view of the shared response stream.
#[derive(Clone)]
pub struct OutputHandle {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Write for OutputHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self.inner.lock().expect("output stream lock poisoned");
        // write_all under the lock: the buffer is never split across
        // another handle's bytes.
        out.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut out = self.inner.lock().expect("output stream lock poisoned");
        out.flush()
    }
}

impl std::fmt::Debug for OutputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputHandle").finish_non_exhaustive()
    }
}
