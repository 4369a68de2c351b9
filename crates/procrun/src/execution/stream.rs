//! Stream handling for process input and output

use log::{debug, warn};
use std::fmt;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};

/// Receives each line of one output stream, terminator included
pub type LineCallback<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Which output stream a drain is reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Read `reader` to end-of-stream, one `\n`-delimited line at a time.
///
/// Every line is appended to the returned buffer and, when a callback is
/// given, passed to it in read order. A final line without terminator is
/// delivered as is. A read error ends the drain; what was read so far is
/// kept.
pub fn drain<R: Read>(
    reader: R,
    kind: StreamKind,
    mut on_line: Option<LineCallback<'_>>,
) -> String {
    let mut reader = BufReader::new(reader);
    let mut buffer = String::new();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&raw);
                if let Some(callback) = on_line.as_mut() {
                    callback(&line);
                }
                buffer.push_str(&line);
            }
            Err(e) => {
                warn!("Reading child {} failed: {}", kind, e);
                break;
            }
        }
    }

    debug!("Drained {} bytes from child {}", buffer.len(), kind);
    buffer
}

/// Write the whole payload to the child's stdin, then close it
pub fn feed_stdin<W: Write>(mut stdin: W, payload: &[u8]) {
    match stdin.write_all(payload).and_then(|()| stdin.flush()) {
        Ok(()) => debug!("Wrote {} bytes to child stdin", payload.len()),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("Child closed stdin before reading all input");
        }
        Err(e) => warn!("Writing child stdin failed: {}", e),
    }
}
