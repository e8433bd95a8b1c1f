//! JavaScript tokenizer
//!
//! Comments are skipped. Template literals are split into their literal
//! chunks and the tokens of each `${...}` substitution. Regular expression
//! literals are recognized from the previous significant token. A `<` in
//! expression position opens a JSX element; its text children become one
//! token per run and are never scanned as code.

use super::{eat_number, Cursor, LexError, Token};

const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", ">>", "**", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

/// Keywords after which a `/` starts a regular expression
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Opening,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Block,
    Template,
    /// `{...}` among JSX children
    JsxExpr,
    /// JSX element tree; `tag` is `None` while scanning children
    Element { depth: usize, tag: Option<Tag> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    None,
    Punct,
    /// `)`, `]` or `}`
    Closer,
    Keyword,
    Value,
}

/// Tokenize JavaScript source
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = JsLexer::new(source);
    lexer.run()?;
    Ok(lexer.tokens)
}

struct JsLexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    contexts: Vec<Context>,
    prev: Prev,
}

impl<'a> JsLexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            contexts: Vec::new(),
            prev: Prev::None,
        }
    }

    fn run(&mut self) -> Result<(), LexError> {
        if self.cursor.is_at_start() && self.cursor.starts_with("#!") {
            self.cursor.eat_while(|c| c != '\n');
        }

        while let Some(ch) = self.cursor.peek() {
            if let Some(Context::Element { tag: None, .. }) = self.contexts.last() {
                self.jsx_children()?;
                continue;
            }
            if ch.is_whitespace() {
                self.cursor.bump();
                continue;
            }
            if self.cursor.starts_with("//") {
                self.cursor.eat_while(|c| c != '\n');
                continue;
            }
            if self.cursor.starts_with("/*") {
                self.block_comment()?;
                continue;
            }

            let (start, line, column) = self.mark();
            match ch {
                '"' | '\'' => {
                    self.string(ch)?;
                    self.push(start, line, column, Prev::Value);
                }
                '`' => {
                    self.cursor.bump();
                    self.template_chunk(start, line, column)?;
                }
                '}' if self.contexts.last() == Some(&Context::Template) => {
                    self.contexts.pop();
                    self.cursor.bump();
                    self.template_chunk(start, line, column)?;
                }
                '}' if self.contexts.last() == Some(&Context::JsxExpr) => {
                    self.contexts.pop();
                    self.cursor.bump();
                    self.push(start, line, column, Prev::Closer);
                }
                '>' if self.in_tag() => {
                    self.cursor.bump();
                    self.push(start, line, column, Prev::Punct);
                    self.close_tag();
                }
                '/' if self.in_tag() => {
                    self.cursor.bump();
                    if self.cursor.peek() == Some('>') {
                        self.cursor.bump();
                        self.push(start, line, column, Prev::Punct);
                        self.end_element();
                    } else {
                        self.push(start, line, column, Prev::Punct);
                    }
                }
                '<' if self.regex_allowed()
                    && self
                        .cursor
                        .peek_nth(1)
                        .is_some_and(|c| c == '>' || is_ident_start(c)) =>
                {
                    self.cursor.bump();
                    self.contexts.push(Context::Element {
                        depth: 1,
                        tag: Some(Tag::Opening),
                    });
                    self.push(start, line, column, Prev::Punct);
                }
                '/' if self.regex_allowed() => {
                    self.regex(line)?;
                    self.push(start, line, column, Prev::Value);
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.cursor.peek_nth(1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    eat_number(&mut self.cursor);
                    self.push(start, line, column, Prev::Value);
                }
                c if is_ident_start(c) || c == '#' => {
                    self.cursor.bump();
                    self.cursor.eat_while(is_ident_part);
                    let word = self.cursor.slice(start);
                    let kind = if REGEX_PRECEDING_KEYWORDS.contains(&word) {
                        Prev::Keyword
                    } else {
                        Prev::Value
                    };
                    self.push(start, line, column, kind);
                }
                _ => self.punctuator(ch, start, line, column)?,
            }
        }
        Ok(())
    }

    fn punctuator(
        &mut self,
        ch: char,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<(), LexError> {
        let Some(op) = PUNCTUATORS
            .iter()
            .find(|op| self.cursor.starts_with(op))
            .copied()
        else {
            return Err(LexError::UnexpectedChar { ch, line, column });
        };

        // `a?.5:b` is a conditional, not optional chaining
        let op = if op == "?." && self.cursor.peek_nth(2).is_some_and(|c| c.is_ascii_digit()) {
            "?"
        } else {
            op
        };

        self.cursor.bump_n(op.len());
        match op {
            "{" => self.contexts.push(Context::Block),
            "}" if self.contexts.last() == Some(&Context::Block) => {
                self.contexts.pop();
            }
            _ => {}
        }
        let kind = if matches!(op, ")" | "]" | "}") {
            Prev::Closer
        } else {
            Prev::Punct
        };
        self.push(start, line, column, kind);
        Ok(())
    }

    fn regex_allowed(&self) -> bool {
        matches!(self.prev, Prev::None | Prev::Punct | Prev::Keyword)
    }

    fn in_tag(&self) -> bool {
        matches!(self.contexts.last(), Some(Context::Element { tag: Some(_), .. }))
    }

    /// `>` finishes the current tag
    fn close_tag(&mut self) {
        let Some(Context::Element { tag, .. }) = self.contexts.last_mut() else {
            return;
        };
        if *tag == Some(Tag::Closing) {
            self.end_element();
        } else {
            *tag = None;
        }
    }

    /// A closing or self-closing tag ends one level of nesting
    fn end_element(&mut self) {
        let Some(Context::Element { depth, tag }) = self.contexts.last_mut() else {
            return;
        };
        *depth -= 1;
        if *depth == 0 {
            self.contexts.pop();
            self.prev = Prev::Value;
        } else {
            *tag = None;
        }
    }

    /// Scan JSX text up to the next tag or `{` expression
    fn jsx_children(&mut self) -> Result<(), LexError> {
        let line = self.cursor.line();
        self.cursor.eat_while(char::is_whitespace);
        let (start, text_line, column) = self.mark();
        self.cursor.eat_while(|c| c != '<' && c != '{');
        let text = self.cursor.slice(start).trim_end();
        if !text.is_empty() {
            self.tokens.push(Token {
                value: text.to_string(),
                line: text_line,
                column,
            });
        }

        let (start, line_at, column) = self.mark();
        match self.cursor.peek() {
            None => Err(LexError::Unterminated {
                what: "JSX element",
                line,
            }),
            Some('{') => {
                self.cursor.bump();
                self.contexts.push(Context::JsxExpr);
                self.push(start, line_at, column, Prev::Punct);
                Ok(())
            }
            Some(_) => {
                let closing = self.cursor.peek_nth(1) == Some('/');
                if let Some(Context::Element { depth, tag }) = self.contexts.last_mut() {
                    if closing {
                        *tag = Some(Tag::Closing);
                    } else {
                        *depth += 1;
                        *tag = Some(Tag::Opening);
                    }
                }
                self.cursor.bump();
                self.push(start, line_at, column, Prev::Punct);
                Ok(())
            }
        }
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let line = self.cursor.line();
        self.cursor.bump_n(2);
        loop {
            if self.cursor.starts_with("*/") {
                self.cursor.bump_n(2);
                return Ok(());
            }
            if self.cursor.bump().is_none() {
                return Err(LexError::Unterminated {
                    what: "block comment",
                    line,
                });
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<(), LexError> {
        let line = self.cursor.line();
        self.cursor.bump();
        loop {
            match self.cursor.bump() {
                None | Some('\n') => {
                    return Err(LexError::Unterminated {
                        what: "string literal",
                        line,
                    })
                }
                Some('\\') => {
                    if self.cursor.peek() == Some('\r') {
                        self.cursor.bump();
                    }
                    self.cursor.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// Scan template text up to the closing backtick or the next `${`
    fn template_chunk(&mut self, start: usize, line: usize, column: usize) -> Result<(), LexError> {
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::Unterminated {
                        what: "template literal",
                        line,
                    })
                }
                Some('\\') => {
                    self.cursor.bump_n(2);
                }
                Some('`') => {
                    self.cursor.bump();
                    self.push(start, line, column, Prev::Value);
                    return Ok(());
                }
                Some('$') if self.cursor.peek_nth(1) == Some('{') => {
                    self.cursor.bump_n(2);
                    self.contexts.push(Context::Template);
                    self.push(start, line, column, Prev::Punct);
                    return Ok(());
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    fn regex(&mut self, line: usize) -> Result<(), LexError> {
        self.cursor.bump();
        let mut in_class = false;
        loop {
            match self.cursor.bump() {
                None | Some('\n') => {
                    return Err(LexError::Unterminated {
                        what: "regular expression",
                        line,
                    })
                }
                Some('\\') => {
                    self.cursor.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        // Flags
        self.cursor.eat_while(is_ident_part);
        Ok(())
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.cursor.pos(), self.cursor.line(), self.cursor.column())
    }

    fn push(&mut self, start: usize, line: usize, column: usize, kind: Prev) {
        self.prev = kind;
        self.tokens.push(Token {
            value: self.cursor.slice(start).to_string(),
            line,
            column,
        });
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<String> {
        tokenize(source)
            .expect("should tokenize")
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_declaration() {
        assert_eq!(values("const x = 42;"), vec!["const", "x", "=", "42", ";"]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let toks = values("// leading\nlet a = 1; /* block\n comment */ let b = 2;");
        assert_eq!(toks, vec!["let", "a", "=", "1", ";", "let", "b", "=", "2", ";"]);
    }

    #[test]
    fn test_longest_punctuator_match() {
        let toks = values("a >>>= b === c ?? d?.e");
        assert!(toks.contains(&">>>=".to_string()));
        assert!(toks.contains(&"===".to_string()));
        assert!(toks.contains(&"??".to_string()));
        assert!(toks.contains(&"?.".to_string()));
    }

    #[test]
    fn test_optional_chain_before_digit_is_conditional() {
        let toks = values("x = a?.5:1");
        assert!(toks.contains(&"?".to_string()));
        assert!(toks.contains(&".5".to_string()));
    }

    #[test]
    fn test_template_substitutions_are_tokenized() {
        let toks = values("const s = `Hello ${name}, you are ${age + 1}`;");
        assert_eq!(
            toks,
            vec![
                "const",
                "s",
                "=",
                "`Hello ${",
                "name",
                "}, you are ${",
                "age",
                "+",
                "1",
                "}`",
                ";"
            ]
        );
    }

    #[test]
    fn test_nested_braces_in_template() {
        let toks = values("`${ {a: 1}.a }`");
        assert_eq!(toks.first().map(String::as_str), Some("`${"));
        assert_eq!(toks.last().map(String::as_str), Some("}`"));
    }

    #[test]
    fn test_regex_vs_division() {
        let toks = values("const r = /ab+c/gi; const d = a / b / c;");
        assert!(toks.contains(&"/ab+c/gi".to_string()));
        assert_eq!(toks.iter().filter(|t| *t == "/").count(), 2);
    }

    #[test]
    fn test_regex_after_return() {
        let toks = values("function f() { return /[/]x/.test(s); }");
        assert!(toks.contains(&"/[/]x/".to_string()));
    }

    #[test]
    fn test_hashbang_and_private_names() {
        let toks = values("#!/usr/bin/env node\nclass A { #count = 0; }");
        assert_eq!(toks.first().map(String::as_str), Some("class"));
        assert!(toks.contains(&"#count".to_string()));
    }

    #[test]
    fn test_jsx_text_is_not_scanned_as_code() {
        let toks = values("const App = () => <div className=\"x\">don't</div>;");
        assert_eq!(
            toks,
            vec![
                "const", "App", "=", "(", ")", "=>", "<", "div", "className", "=", "\"x\"",
                ">", "don't", "<", "/", "div", ">", ";"
            ]
        );
    }

    #[test]
    fn test_jsx_nesting_and_expressions() {
        let src = "return (\n  <ul>\n    {items.map(i => <li key={i.id}>{i.name}'s</li>)}\n\
                   <br />\n  </ul>\n) / 2;";
        let toks = values(src);
        assert!(toks.contains(&"'s".to_string()));
        assert!(toks.contains(&"/>".to_string()));
        assert_eq!(toks.iter().filter(|t| *t == "/").count(), 3);
        assert_eq!(toks.last().map(String::as_str), Some(";"));
    }

    #[test]
    fn test_less_than_is_still_comparison() {
        let toks = values("if (a <b) { x = i < n; }");
        assert!(!toks.iter().any(|t| t.contains(' ')));
        assert_eq!(toks.iter().filter(|t| *t == "<").count(), 2);
    }

    #[test]
    fn test_unclosed_jsx_element_fails() {
        let err = tokenize("const a = <p>it's open").unwrap_err();
        assert!(matches!(err, LexError::Unterminated { what: "JSX element", .. }));
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize("let s = \"oops\nlet t = 1;").unwrap_err();
        assert!(matches!(err, LexError::Unterminated { line: 1, .. }));
    }

    #[test]
    fn test_unterminated_block_comment_fails() {
        assert!(tokenize("let a = 1; /* never closed").is_err());
    }

    #[test]
    fn test_illegal_character_fails() {
        let err = tokenize("let a = @decorator;").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: '@', .. }));
    }
}
