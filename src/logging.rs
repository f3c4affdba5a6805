use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Writer that ends every line with `\r\n`.
///
/// In raw mode the terminal no longer returns the cursor on a bare `\n`, so
/// plain log lines would march off to the right.
pub struct CrlfWriter<W: Write> {
    inner: W,
    last: Option<u8>,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, last: None }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = Vec::with_capacity(buf.len() + 2);
        for &b in buf {
            if b == b'\n' && self.last != Some(b'\r') {
                out.push(b'\r');
            }
            out.push(b);
            self.last = Some(b);
        }
        self.inner.write_all(&out)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(|| CrlfWriter::new(io::stderr()))
        .init();
}
