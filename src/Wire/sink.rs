use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

use super::Structs::Message;

/// A line writer shared by every thread that talks on one stream.
///
/// Each [`send`](MessageSink::send) writes and flushes one whole line under
/// the lock, so lines from concurrent generator and counter threads never
/// interleave.
#[derive(Clone)]
pub struct MessageSink {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl MessageSink {
    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    /// Encode `message` and write it as one line.
    pub fn send(&self, message: &Message) -> io::Result<()> {
        let line = super::codec::encode(message);
        let mut out = self.out.lock();
        writeln!(out, "{line}")?;
        out.flush()
    }
}

impl std::fmt::Debug for MessageSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSink").finish_non_exhaustive()
    }
}
