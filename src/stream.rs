use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use crate::error::LispResult;

/// The line-oriented input collaborator: one line per call, or `None`
/// once input is exhausted. Lines are returned without their terminator.
pub trait LineSource {
    fn read_line(&mut self) -> LispResult<Option<String>>;
}

/// Lines from an in-memory string.
pub struct StrSource {
    lines: VecDeque<String>,
}

impl StrSource {
    pub fn new(text: &str) -> Self {
        StrSource {
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

impl LineSource for StrSource {
    fn read_line(&mut self) -> LispResult<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Lines from any buffered reader (piped stdin, files).
pub struct BufReadSource<R> {
    reader: R,
}

impl<R: BufRead> BufReadSource<R> {
    pub fn new(reader: R) -> Self {
        BufReadSource { reader }
    }
}

impl<R: BufRead> LineSource for BufReadSource<R> {
    fn read_line(&mut self) -> LispResult<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Folds lower-case input to upper case before the reader sees it.
pub struct Uppercase<S> {
    inner: S,
}

impl<S: LineSource> Uppercase<S> {
    pub fn new(inner: S) -> Self {
        Uppercase { inner }
    }
}

impl<S: LineSource> LineSource for Uppercase<S> {
    fn read_line(&mut self) -> LispResult<Option<String>> {
        Ok(self.inner.read_line()?.map(|line| line.to_uppercase()))
    }
}

/// Character stream over a line source. Each line is followed by a
/// synthetic '\n'. Lines are fetched lazily, so an unread tail of the
/// current line is still there for the next read (including READ).
pub struct CharStream {
    source: Box<dyn LineSource>,
    pending: VecDeque<char>,
    exhausted: bool,
}

impl CharStream {
    pub fn new(source: Box<dyn LineSource>) -> Self {
        CharStream {
            source,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fill(&mut self) -> LispResult<()> {
        while self.pending.is_empty() && !self.exhausted {
            match self.source.read_line()? {
                Some(line) => {
                    self.pending.extend(line.chars());
                    self.pending.push_back('\n');
                }
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    /// Look at the next character without consuming it. `None` at end of input.
    pub fn peek(&mut self) -> LispResult<Option<char>> {
        self.fill()?;
        Ok(self.pending.front().copied())
    }

    /// Consume the next character. `None` at end of input.
    pub fn next_char(&mut self) -> LispResult<Option<char>> {
        self.fill()?;
        Ok(self.pending.pop_front())
    }

    /// Discard whatever remains of the current line.
    pub fn discard_line(&mut self) {
        self.pending.clear();
    }
}

/// An output sink that can be read back, for tests and embedding.
#[derive(Clone, Default)]
pub struct SharedOutput {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    /// Return everything written so far and clear the buffer.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.buf.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_get_synthetic_newlines() {
        let mut stream = CharStream::new(Box::new(StrSource::new("ab\nc")));
        let mut seen = String::new();
        while let Some(c) = stream.next_char().unwrap() {
            seen.push(c);
        }
        assert_eq!(seen, "ab\nc\n");
        assert_eq!(stream.peek().unwrap(), None);
    }

    #[test]
    fn uppercase_adapter_folds_case() {
        let mut src = Uppercase::new(StrSource::new("(quote abc)"));
        assert_eq!(src.read_line().unwrap().as_deref(), Some("(QUOTE ABC)"));
        assert_eq!(src.read_line().unwrap(), None);
    }

    #[test]
    fn bufread_source_strips_terminators() {
        let mut src = BufReadSource::new(io::Cursor::new("one\r\ntwo\n"));
        assert_eq!(src.read_line().unwrap().as_deref(), Some("one"));
        assert_eq!(src.read_line().unwrap().as_deref(), Some("two"));
        assert_eq!(src.read_line().unwrap(), None);
    }

    #[test]
    fn shared_output_take_clears() {
        let mut out = SharedOutput::new();
        write!(out, "A∙B").unwrap();
        assert_eq!(out.clone().take(), "A∙B");
        assert_eq!(out.contents(), "");
    }
}
