//! Fixed capacity text helpers
//!
//! Layers and message fields live in `heapless::String`s. Anything longer
//! than the capacity is cut off on a character boundary instead of failing.

use core::fmt::{self, Write};

use heapless::String;

/// Capacity of every text layer in bytes
pub const LAYER_TEXT_LEN: usize = 32;

/// Text shown by a single layer
pub type LayerText = String<LAYER_TEXT_LEN>;

/// Append as much of `text` as fits. Returns `false` if something was cut.
pub fn push_truncated<const N: usize>(buf: &mut String<N>, text: &str) -> bool {
    for c in text.chars() {
        if buf.push(c).is_err() {
            return false;
        }
    }
    true
}

/// `fmt::Write` adapter that silently drops overflowing output.
///
/// Once a piece did not fit, everything after it is dropped too, so the
/// result is always a prefix of the full text.
pub struct Truncating<'a, const N: usize> {
    buf: &'a mut String<N>,
    overflowed: bool,
}

impl<'a, const N: usize> Truncating<'a, N> {
    pub fn new(buf: &'a mut String<N>) -> Self {
        Self {
            buf,
            overflowed: false,
        }
    }

    /// Whether any output was dropped
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.overflowed && !push_truncated(self.buf, s) {
            self.overflowed = true;
        }
        Ok(())
    }
}

/// Format `args` into a new string, keeping the prefix that fits.
pub fn format_truncated<const N: usize>(args: fmt::Arguments<'_>) -> String<N> {
    let mut buf = String::new();
    // Truncating never reports an error
    let _ = Truncating::new(&mut buf).write_fmt(args);
    buf
}
