//! Lexical tokenizers and token statistics
//!
//! Each language has a hand-written tokenizer producing an ordered token
//! stream. The stream is only used for frequency statistics (Shannon entropy),
//! so tokens are kept as plain strings with their position.

pub mod javascript;
pub mod python;

use crate::models::Language;
use std::collections::BTreeMap;
use thiserror::Error;

/// An atomic lexical unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    /// 1-based line number
    pub line: usize,
    /// 0-based column (in chars)
    pub column: usize,
}

/// Tokenizer failures. Never surfaced to callers of the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated {what} starting at line {line}")]
    Unterminated { what: &'static str, line: usize },

    #[error("EOF in multi-line statement (bracket opened at line {line})")]
    UnclosedBracket { line: usize },

    #[error("unindent does not match any outer indentation level (line {line})")]
    InconsistentDedent { line: usize },

    #[error("unexpected character {ch:?} at line {line}, column {column}")]
    UnexpectedChar { ch: char, line: usize, column: usize },
}

/// Tokenize source text with the tokenizer of the given language
pub fn tokenize(source: &str, language: Language) -> Result<Vec<Token>, LexError> {
    match language {
        Language::Python => python::tokenize(source),
        Language::JavaScript => javascript::tokenize(source),
    }
}

/// Distinct token → occurrence count
#[derive(Debug, Clone, Default)]
pub struct TokenFrequency<'a> {
    counts: BTreeMap<&'a str, usize>,
    total: usize,
}

impl<'a> TokenFrequency<'a> {
    pub fn from_tokens(tokens: &'a [Token]) -> Self {
        let mut counts: BTreeMap<&'a str, usize> = BTreeMap::new();
        for token in tokens {
            *counts.entry(token.value.as_str()).or_insert(0) += 1;
        }
        Self {
            counts,
            total: tokens.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Shannon entropy in bits over the token distribution (0 when empty)
    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        let entropy: f64 = self
            .counts
            .values()
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum();
        // A single distinct token yields -0.0
        entropy.max(0.0)
    }
}

/// Shannon entropy of a token sequence
pub fn token_entropy(tokens: &[Token]) -> f64 {
    TokenFrequency::from_tokens(tokens).entropy()
}

/// Char cursor with line/column tracking, shared by the tokenizers
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 0,
        }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub(crate) fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Advance over `n` chars
    pub(crate) fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    pub(crate) fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn column(&self) -> usize {
        self.column
    }

    pub(crate) fn slice(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }

    pub(crate) fn is_at_start(&self) -> bool {
        self.pos == 0
    }
}

/// Numeric literal body shared by both languages: digits, letters, `_`, `.`,
/// and a sign directly after a decimal exponent marker.
pub(crate) fn eat_number(cursor: &mut Cursor<'_>) {
    let radix_prefixed = matches!(
        (cursor.peek(), cursor.peek_nth(1)),
        (Some('0'), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'))
    );
    let mut prev = '\0';
    while let Some(ch) = cursor.peek() {
        let take = ch.is_ascii_alphanumeric()
            || ch == '_'
            || (ch == '.' && !radix_prefixed && cursor.peek_nth(1) != Some('.'))
            || (matches!(ch, '+' | '-') && !radix_prefixed && matches!(prev, 'e' | 'E'));
        if !take {
            break;
        }
        prev = ch;
        cursor.bump();
    }
}
