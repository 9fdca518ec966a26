//! Lexical analysis.
//!
//! The lexer is the only component that decides what is shell text and what
//! is structural. It is driven by the parser: at a statement boundary the
//! parser asks for a *structural* token (keywords, identifiers, literals,
//! punctuation); inside a command body it asks for a *shell-text run*
//! instead, which is a maximal span of characters up to the next structural
//! boundary. Inline function decorators (`@var(X)`) are not split out by the
//! lexer itself — they are extracted from a shell-text run by a registry-
//! gated post-pass in [`crate::parser::decorator`].

use crate::source::{Code, Location, Source};
use std::sync::Arc;

/// A reserved word recognized only at statement-start position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Keyword {
    Var,
    Watch,
    Stop,
    When,
    Try,
}

impl Keyword {
    fn from_str(s: &str) -> Option<Keyword> {
        match s {
            "var" => Some(Keyword::Var),
            "watch" => Some(Keyword::Watch),
            "stop" => Some(Keyword::Stop),
            "when" => Some(Keyword::When),
            "try" => Some(Keyword::Try),
            _ => None,
        }
    }
}

/// Classification of a token produced by [`Lexer`].
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    Number(String),
    /// A duration literal; `nanos` is the value normalized to nanoseconds.
    Duration { raw: String, nanos: u128 },
    /// A string literal; `raw` preserves the original text (including
    /// quotes and unprocessed backslash escapes), `value` is the unquoted
    /// content.
    String { raw: String, value: String },
    Boolean(bool),
    /// A maximal run of shell text, terminated by a structural boundary.
    /// Inline function decorators have not yet been extracted.
    ShellText(String),
    At,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Colon,
    Comma,
    Equals,
    Asterisk,
    Eof,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

/// A lexical error: unterminated
/// string, unmatched paren in a decorator argument list, or EOF inside a
/// brace block.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub location: Location,
}

pub struct Lexer {
    code: Arc<Code>,
    pos: usize,
}

/// Returns true if `c` may start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Returns true if `c` may continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_blank(c: char) -> bool {
    c != '\n' && c.is_whitespace()
}

impl Lexer {
    #[must_use]
    pub fn new(text: &str, name: &str) -> Self {
        let code = Arc::new(Code::new(text, Source::Main { name: name.into() }));
        Lexer { code, pos: 0 }
    }

    #[must_use]
    pub fn from_code(code: Arc<Code>) -> Self {
        Lexer { code, pos: 0 }
    }

    #[must_use]
    pub fn code(&self) -> &Arc<Code> {
        &self.code
    }

    fn rest(&self) -> &str {
        &self.code.value[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, byte_offset: usize) -> Option<char> {
        self.code.value[self.pos + byte_offset..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn location(&self, start: usize) -> Location {
        Location {
            code: Arc::clone(&self.code),
            range: start..self.pos,
        }
    }

    fn skip_blanks_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            while self.peek().is_some_and(is_blank) {
                self.advance();
            }
            match self.peek() {
                Some('\n') => {
                    self.advance();
                }
                Some('#') => {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.pos;
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(LexError {
                                    message: "unterminated multiline comment".into(),
                                    location: self.location(start),
                                });
                            }
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Returns the next structural token, skipping blanks, newlines, and
    /// comments first.
    pub fn next_structural(&mut self) -> Result<Token, LexError> {
        self.skip_blanks_and_comments()?;
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                location: self.location(start),
            });
        };
        let kind = match c {
            '@' => {
                self.advance();
                TokenKind::At
            }
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            '{' => {
                self.advance();
                TokenKind::LBrace
            }
            '}' => {
                self.advance();
                TokenKind::RBrace
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '=' => {
                self.advance();
                TokenKind::Equals
            }
            '*' => {
                self.advance();
                TokenKind::Asterisk
            }
            '"' | '\'' | '`' => self.scan_string(c, start)?,
            c if c.is_ascii_digit() || ((c == '+' || c == '-') && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) => {
                self.scan_number_or_duration(start)
            }
            c if is_ident_start(c) => self.scan_identifier_like(start),
            other => {
                return Err(LexError {
                    message: format!("unexpected character '{other}'"),
                    location: self.location(start),
                });
            }
        };
        Ok(Token {
            kind,
            location: self.location(start),
        })
    }

    /// Peeks the next structural token without consuming it.
    pub fn peek_structural(&mut self) -> Result<Token, LexError> {
        let save = self.pos;
        let token = self.next_structural();
        self.pos = save;
        token
    }

    fn scan_string(&mut self, quote: char, start: usize) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        message: "unterminated string literal".into(),
                        location: self.location(start),
                    });
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') if quote == '"' => {
                    // Backslash escapes are preserved verbatim in the raw
                    // form; we only need to not let `\"` terminate the literal.
                    value.push('\\');
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        value.push(escaped);
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        let raw = self.code.value[start..self.pos].to_string();
        Ok(TokenKind::String { raw, value })
    }

    fn scan_number_or_duration(&mut self, start: usize) -> TokenKind {
        if self.peek() == Some('+') || self.peek() == Some('-') {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let digits_end = self.pos;
        let unit_start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphabetic()) {
            self.advance();
        }
        let unit = &self.code.value[unit_start..self.pos];
        if let Some(nanos_per_unit) = duration_unit_nanos(unit) {
            let digits = &self.code.value[start..digits_end];
            // Duration literals are plain (non-fractional) integers per the
            // External Interfaces grammar.
            if let Ok(n) = digits.trim_start_matches('+').parse::<u128>() {
                let raw = self.code.value[start..self.pos].to_string();
                return TokenKind::Duration {
                    raw,
                    nanos: n.saturating_mul(nanos_per_unit),
                };
            }
        }
        // Not a recognized duration unit: back out the alphabetic run so
        // the unit text is not silently swallowed into the number.
        self.pos = digits_end;
        TokenKind::Number(self.code.value[start..self.pos].to_string())
    }

    fn scan_identifier_like(&mut self, start: usize) -> TokenKind {
        self.advance();
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        let text = &self.code.value[start..self.pos];
        if let Some(keyword) = Keyword::from_str(text) {
            TokenKind::Keyword(keyword)
        } else if text == "true" {
            TokenKind::Boolean(true)
        } else if text == "false" {
            TokenKind::Boolean(false)
        } else {
            TokenKind::Identifier(text.to_string())
        }
    }

    /// Scans one maximal shell-text run: it stops at an unescaped
    /// `{`, `}`, newline, or end of input. Quoted regions (`"`, `'`, `` ` ``)
    /// pass through verbatim, so none of those characters inside a quote
    /// ends the run. A backslash immediately before a newline is a line
    /// continuation: both characters are dropped and replaced with a single
    /// space. Any other backslash-escaped character is copied through
    /// literally and does not trigger termination.
    ///
    /// This does *not* stop at `@name(`; inline function-decorator
    /// extraction is a separate post-pass over the returned text.
    pub fn next_shell_text(&mut self) -> Result<Token, LexError> {
        // A leading run of blank characters at a content boundary is not
        // part of the shell text (it is indentation before the command).
        while self.peek().is_some_and(is_blank) {
            self.advance();
        }
        let start = self.pos;
        let mut text = String::new();
        let mut quote: Option<char> = None;
        loop {
            match self.peek() {
                None => break,
                Some('\n') if quote.is_none() => break,
                Some('{') | Some('}') if quote.is_none() => break,
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                    text.push(' ');
                }
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                Some(c) => {
                    match quote {
                        Some(q) if c == q => quote = None,
                        None if c == '"' || c == '\'' || c == '`' => quote = Some(c),
                        _ => {}
                    }
                    text.push(c);
                    self.advance();
                }
            }
        }
        // Trim only trailing blanks so multi-token shell text keeps internal
        // spacing; trailing blanks before a newline/brace are insignificant.
        let trimmed_len = text.trim_end_matches(is_blank).len();
        text.truncate(trimmed_len);
        Ok(Token {
            kind: TokenKind::ShellText(text),
            location: self.location(start),
        })
    }

    /// True if the lexer has no more structural content (ignoring
    /// trailing blanks/comments/newlines).
    pub fn at_eof(&mut self) -> Result<bool, LexError> {
        let save = self.pos;
        self.skip_blanks_and_comments()?;
        let eof = self.peek().is_none();
        self.pos = save;
        Ok(eof)
    }

    /// Consumes leading blanks, newlines, and comments without producing a
    /// token. The parser calls this before [`Lexer::mark`] so that a
    /// rewind point never sits in front of insignificant whitespace.
    pub(crate) fn skip_insignificant(&mut self) -> Result<(), LexError> {
        self.skip_blanks_and_comments()
    }

    /// Captures the current byte position for a later [`Lexer::reset`].
    /// Used by the parser to try a structural token and fall back to
    /// re-lexing the same span as shell text when the lookahead doesn't
    /// pan out.
    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// Steps past one character unconditionally. Used only by error
    /// recovery, to guarantee forward progress past a byte that can't
    /// start any recognized token.
    pub(crate) fn bump_one_for_recovery(&mut self) {
        if self.advance().is_none() {
            self.pos = self.code.value.len();
        }
    }
}

fn duration_unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{b5}s" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(3_600 * 1_000_000_000),
        _ => None,
    }
}
