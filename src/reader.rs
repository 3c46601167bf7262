use std::io::{self, BufRead};

/// A line source for QIF data.
///
/// QIF is line oriented: every record is a sequence of single-letter-prefixed
/// fields, one per line, terminated by a line containing only `^`. The reader
/// trims surrounding whitespace, silently skips blank lines and supports
/// exactly one line of pushback, so that a section handler which has read one
/// line too far can give it back before returning control to its caller.
pub struct QifReader<R> {
    input: R,
    pending: Option<String>,
}

impl<R: BufRead> QifReader<R> {
    pub fn new(input: R) -> Self {
        QifReader {
            input,
            pending: None,
        }
    }

    /// Returns the next non-blank line, or `None` at the end of the stream.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.input.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            let line = buf.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }

    /// Returns the line the next call to `read_line` will produce, without
    /// consuming it. Blank lines skipped while peeking are discarded.
    pub fn peek_line(&mut self) -> io::Result<Option<&str>> {
        if self.pending.is_none() {
            self.pending = self.read_line()?;
        }
        Ok(self.pending.as_deref())
    }

    /// Gives one line back to the reader. At most one line may be pending.
    pub fn push_back(&mut self, line: String) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(line);
    }
}
