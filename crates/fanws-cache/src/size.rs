use serde::Serialize;
use std::io;

/// Approximate in-cache size of `value`: the length of its JSON encoding.
///
/// The encoding is streamed into a byte counter, so nothing is buffered.
/// Values that refuse to serialize fall back to their shallow in-memory size.
pub fn estimate_size<V: Serialize + ?Sized>(value: &V) -> u64 {
    let mut counter = ByteCounter(0);
    match serde_json::to_writer(&mut counter, value) {
        Ok(()) => counter.0,
        Err(err) => {
            tracing::debug!(
                target = "fanws.cache",
                error = %err,
                "value is not serializable; using shallow size"
            );
            std::mem::size_of_val(value) as u64
        }
    }
}

struct ByteCounter(u64);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 = self.0.saturating_add(buf.len() as u64);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
