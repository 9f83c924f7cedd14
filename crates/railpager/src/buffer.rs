//! Shared message buffer

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append/drain buffer of output lines
///
/// The ingestion thread [pushes](MessageBuffer::push) lines
/// and the consumer [drains](MessageBuffer::drain) them. One
/// lock serializes both operations, and it is only held for
/// the duration of a single push or drain. A drain therefore
/// returns every line pushed before it began and none of the
/// lines pushed after it.
///
/// Clones share the same storage. The buffer is unbounded.
///
/// ```
/// use railpager::MessageBuffer;
///
/// let buf = MessageBuffer::new();
/// let producer = buf.clone();
/// producer.push("Connected to 127.0.0.1:14423");
/// producer.push("[MSG] 0001234000 ABC123 80 4521");
///
/// assert_eq!(
///     "Connected to 127.0.0.1:14423\n[MSG] 0001234000 ABC123 80 4521",
///     buf.drain()
/// );
/// assert_eq!("", buf.drain());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MessageBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MessageBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line
    pub fn push<S>(&self, line: S)
    where
        S: Into<String>,
    {
        let line = line.into();
        self.lock().push(line);
    }

    /// Take all buffered lines
    ///
    /// The buffer is left empty. Lines are returned in the
    /// order they were pushed.
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    /// Take all buffered lines, joined by newlines
    ///
    /// Returns the empty string if there are no lines.
    pub fn drain(&self) -> String {
        self.take_lines().join("\n")
    }

    /// Number of buffered lines
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no lines are buffered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // poisoning is ignored: push and take never leave the
    // Vec partially modified
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
