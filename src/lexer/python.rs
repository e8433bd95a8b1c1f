//! Python tokenizer
//!
//! Produces the same kind of stream as Python's own `tokenize` module:
//! comments are tokens, every line break is a `"\n"` token, INDENT carries the
//! indentation whitespace and DEDENT is an empty token. A trailing empty
//! NEWLINE is emitted when the source does not end with a line break.

use super::{eat_number, Cursor, LexError, Token};

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: &[&str] = &[
    "!=", "==", "<=", ">=", "**", "//", "->", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "@=", ":=", "<<", ">>",
];

/// Tokenize Python source
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = PythonLexer::new(source);
    lexer.run()?;
    Ok(lexer.tokens)
}

struct PythonLexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    /// Open bracket lines, innermost last
    brackets: Vec<usize>,
    at_line_start: bool,
    /// Current logical line has produced a non-comment token
    line_has_tokens: bool,
}

impl<'a> PythonLexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
            line_has_tokens: false,
        }
    }

    fn run(&mut self) -> Result<(), LexError> {
        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.indentation()?;
            }
            let Some(ch) = self.cursor.peek() else { break };

            match ch {
                ' ' | '\t' | '\x0c' | '\r' => {
                    self.cursor.bump();
                }
                '\n' => {
                    let (line, column) = (self.cursor.line(), self.cursor.column());
                    self.cursor.bump();
                    self.push_at("\n", line, column);
                    if self.brackets.is_empty() {
                        self.at_line_start = true;
                        self.line_has_tokens = false;
                    }
                }
                '#' => {
                    let (start, line, column) = self.mark();
                    self.cursor.eat_while(|c| c != '\n' && c != '\r');
                    let text = self.cursor.slice(start);
                    self.push_at(text, line, column);
                }
                '\\' if matches!(self.cursor.peek_nth(1), Some('\n' | '\r')) => {
                    // Explicit line joining
                    self.cursor.bump();
                    if self.cursor.peek() == Some('\r') {
                        self.cursor.bump();
                    }
                    if self.cursor.peek() == Some('\n') {
                        self.cursor.bump();
                    }
                }
                _ => {
                    if let Some(prefix_len) = self.string_prefix_len() {
                        self.string(prefix_len)?;
                    } else if ch.is_ascii_digit()
                        || (ch == '.'
                            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()))
                    {
                        let (start, line, column) = self.mark();
                        eat_number(&mut self.cursor);
                        let text = self.cursor.slice(start);
                        self.push_code(text, line, column);
                    } else if ch.is_alphabetic() || ch == '_' {
                        let (start, line, column) = self.mark();
                        self.cursor.eat_while(|c| c.is_alphanumeric() || c == '_');
                        let text = self.cursor.slice(start);
                        self.push_code(text, line, column);
                    } else {
                        self.operator(ch);
                    }
                }
            }
        }

        if let Some(&line) = self.brackets.last() {
            return Err(LexError::UnclosedBracket { line });
        }
        let (line, column) = (self.cursor.line(), self.cursor.column());
        if self.line_has_tokens {
            self.push_at("", line, column);
        }
        for _ in 1..self.indents.len() {
            self.push_at("", line, column);
        }
        Ok(())
    }

    /// Process leading whitespace of a physical line outside brackets
    fn indentation(&mut self) -> Result<(), LexError> {
        self.at_line_start = false;
        let (start, line, column) = self.mark();
        let mut width = 0usize;
        while let Some(ch) = self.cursor.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.cursor.bump();
        }

        // Blank and comment-only lines do not affect indentation
        match self.cursor.peek() {
            None | Some('#' | '\n' | '\r') => return Ok(()),
            _ => {}
        }

        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            let text = self.cursor.slice(start);
            self.push_at(text, line, column);
        } else if width < current {
            while self.indents.last().is_some_and(|&i| i > width) {
                self.indents.pop();
                self.push_at("", line, self.cursor.column());
            }
            if self.indents.last().copied().unwrap_or(0) != width {
                return Err(LexError::InconsistentDedent { line });
            }
        }
        Ok(())
    }

    /// Length of a valid string prefix directly followed by a quote
    fn string_prefix_len(&self) -> Option<usize> {
        let rest = self.cursor.rest();
        let prefix_len = rest
            .chars()
            .take_while(|c| matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U' | 'f' | 'F'))
            .count();
        if prefix_len > 2 {
            return None;
        }
        let after = rest[prefix_len..].chars().next();
        if !matches!(after, Some('\'' | '"')) {
            return None;
        }
        let prefix = rest[..prefix_len].to_ascii_lowercase();
        matches!(
            prefix.as_str(),
            "" | "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
        )
        .then_some(prefix_len)
    }

    fn string(&mut self, prefix_len: usize) -> Result<(), LexError> {
        let (start, line, column) = self.mark();
        self.cursor.bump_n(prefix_len);
        let Some(quote) = self.cursor.bump() else {
            return Err(LexError::Unterminated {
                what: "string literal",
                line,
            });
        };
        let triple: String = [quote, quote].iter().collect();
        let is_triple = self.cursor.starts_with(&triple);

        if is_triple {
            self.cursor.bump_n(2);
            let closing: String = [quote, quote, quote].iter().collect();
            loop {
                if self.cursor.starts_with(&closing) {
                    self.cursor.bump_n(3);
                    break;
                }
                match self.cursor.bump() {
                    None => {
                        return Err(LexError::Unterminated {
                            what: "triple-quoted string",
                            line,
                        })
                    }
                    Some('\\') => {
                        self.cursor.bump();
                    }
                    Some(_) => {}
                }
            }
        } else {
            loop {
                match self.cursor.peek() {
                    None | Some('\n') => {
                        return Err(LexError::Unterminated {
                            what: "string literal",
                            line,
                        })
                    }
                    Some('\\') => {
                        self.cursor.bump();
                        if self.cursor.peek() == Some('\r') {
                            self.cursor.bump();
                        }
                        self.cursor.bump();
                    }
                    Some(c) => {
                        self.cursor.bump();
                        if c == quote {
                            break;
                        }
                    }
                }
            }
        }

        let text = self.cursor.slice(start);
        self.push_code(text, line, column);
        Ok(())
    }

    fn operator(&mut self, ch: char) {
        let (start, line, column) = self.mark();
        let width = THREE_CHAR_OPS
            .iter()
            .chain(TWO_CHAR_OPS)
            .find(|op| self.cursor.starts_with(op))
            .map_or(1, |op| op.len());
        self.cursor.bump_n(width);

        match ch {
            '(' | '[' | '{' => self.brackets.push(line),
            ')' | ']' | '}' => {
                self.brackets.pop();
            }
            _ => {}
        }

        let text = self.cursor.slice(start);
        self.push_code(text, line, column);
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.cursor.pos(), self.cursor.line(), self.cursor.column())
    }

    fn push_code(&mut self, value: &str, line: usize, column: usize) {
        self.line_has_tokens = true;
        self.push_at(value, line, column);
    }

    fn push_at(&mut self, value: &str, line: usize, column: usize) {
        self.tokens.push(Token {
            value: value.to_string(),
            line,
            column,
        });
    }
}
