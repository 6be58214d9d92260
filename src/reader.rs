use crate::error::{LispError, LispResult};
use crate::heap::Heap;
use crate::stream::CharStream;
use crate::symbol::SymbolTable;
use crate::value::Value;

/// One lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    Atom(String),
}

/// Characters that end an atom token when they come next.
fn is_delimiter(ch: char) -> bool {
    ch <= ' ' || ch == '(' || ch == ')'
}

/// Reader: parses S-expressions from a character stream into heap values.
/// The token buffer is a plain String, separate from the heap.
pub struct Reader<'a> {
    input: &'a mut CharStream,
    heap: &'a mut Heap,
    symbols: &'a mut SymbolTable,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a mut CharStream, heap: &'a mut Heap, symbols: &'a mut SymbolTable) -> Self {
        Reader {
            input,
            heap,
            symbols,
        }
    }

    /// Read one expression. `EndOfInput` if the source runs dry first.
    pub fn read_expression(&mut self) -> LispResult<Value> {
        match self.next_token()? {
            None => Err(LispError::EndOfInput),
            Some(Token::Open) => self.read_list(),
            Some(Token::Close) => Err(LispError::UnexpectedClose),
            Some(Token::Atom(name)) => self.atom(&name),
        }
    }

    /// Next token, or None at end of input.
    pub fn next_token(&mut self) -> LispResult<Option<Token>> {
        // Skip whitespace and control characters
        let first = loop {
            match self.input.next_char()? {
                None => return Ok(None),
                Some(ch) if ch <= ' ' => continue,
                Some(ch) => break ch,
            }
        };

        match first {
            '(' => return Ok(Some(Token::Open)),
            ')' => return Ok(Some(Token::Close)),
            _ => {}
        }

        let mut token = String::new();
        token.push(first);
        while let Some(ch) = self.input.peek()? {
            if is_delimiter(ch) {
                break;
            }
            token.push(ch);
            self.input.next_char()?;
        }
        Ok(Some(Token::Atom(token)))
    }

    /// Read list elements after a consumed '(' up to the matching ')'.
    /// Nested lists are kept on an explicit stack, so nesting depth is
    /// limited by the heap rather than the native stack.
    fn read_list(&mut self) -> LispResult<Value> {
        // Elements of every list still open, innermost last.
        let mut open: Vec<Vec<Value>> = vec![Vec::new()];
        loop {
            let element = match self.next_token()? {
                None => return Err(LispError::UnbalancedInput),
                Some(Token::Open) => {
                    open.push(Vec::new());
                    continue;
                }
                Some(Token::Close) => {
                    let elements = open.pop().unwrap_or_default();
                    let list = self.heap.list(&elements)?;
                    if open.is_empty() {
                        return Ok(list);
                    }
                    list
                }
                Some(Token::Atom(name)) => self.atom(&name)?,
            };
            if let Some(current) = open.last_mut() {
                current.push(element);
            }
        }
    }

    /// Intern an atom token. The spelling NIL is the NIL singleton.
    fn atom(&mut self, name: &str) -> LispResult<Value> {
        if name == "NIL" {
            return Ok(Value::Nil);
        }
        Ok(Value::Atom(self.symbols.intern(name)?))
    }
}
