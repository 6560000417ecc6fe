//! Character cursor over program text

/// Cursor position: 1-indexed line and column plus absolute offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    /// Byte offset; spans index the source text with it
    pub offset: usize,
    /// Character offset
    pub char_offset: usize,
}

/// Sequential reader over the characters of a source text.
///
/// Reading past the end yields `None`; the stream never fails.
#[derive(Debug, Clone)]
pub struct CharStream {
    chars: Vec<char>,
    index: usize,
    position: Position,
}

impl CharStream {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            position: Position {
                line: 1,
                column: 1,
                offset: 0,
                char_offset: 0,
            },
        }
    }

    /// Next character without consuming it
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Character after the next one
    pub fn peek_second(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    /// Consume the next character, updating line and column
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.index).copied()?;
        self.index += 1;
        self.position.offset += c.len_utf8();
        self.position.char_offset += 1;
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    /// Consume the next character if it satisfies `pred`
    pub fn next_if(&mut self, pred: impl FnOnce(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(c) if pred(c) => self.next(),
            _ => None,
        }
    }

    pub fn eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_lines_and_columns() {
        let mut stream = CharStream::new("ab\ncd");
        assert_eq!(stream.next(), Some('a'));
        assert_eq!(stream.next(), Some('b'));
        assert_eq!(
            stream.position(),
            Position {
                line: 1,
                column: 3,
                offset: 2,
                char_offset: 2,
            }
        );
        assert_eq!(stream.next(), Some('\n'));
        assert_eq!(
            stream.position(),
            Position {
                line: 2,
                column: 1,
                offset: 3,
                char_offset: 3,
            }
        );
    }

    #[test]
    fn test_past_end_returns_none() {
        let mut stream = CharStream::new("x");
        assert_eq!(stream.peek_second(), None);
        assert_eq!(stream.next(), Some('x'));
        assert!(stream.eof());
        assert_eq!(stream.next(), None);
        assert_eq!(stream.peek(), None);
        assert_eq!(stream.position().offset, 1);
    }

    #[test]
    fn test_byte_and_char_offsets() {
        let mut stream = CharStream::new("ä;");
        stream.next();
        assert_eq!(stream.position().offset, 2);
        assert_eq!(stream.position().char_offset, 1);
        assert_eq!(stream.position().column, 2);
        assert_eq!(stream.next_if(|c| c == ';'), Some(';'));
        assert_eq!(stream.next_if(|_| true), None);
    }
}
