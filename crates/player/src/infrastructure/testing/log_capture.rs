//! In-memory log capture for asserting on tracing output.

use std::io;
use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct VecMakeWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for VecMakeWriter {
    type Writer = VecWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        VecWriterGuard(Arc::clone(&self.0))
    }
}

struct VecWriterGuard(Arc<Mutex<Vec<u8>>>);

impl io::Write for VecWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captures INFO and above for the current thread until dropped.
///
/// Use with the default (current-thread) `#[tokio::test]` runtime so spawned
/// tasks log into the same subscriber.
pub struct LogCapture {
    writer: VecMakeWriter,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn install() -> Self {
        let writer = VecMakeWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            writer,
            _guard: guard,
        }
    }

    pub fn contents(&self) -> String {
        let bytes = self.writer.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
