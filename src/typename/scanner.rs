//! Lexical scanner for the type-name grammar.
//!
//! Tokenizes a type-name string into a small alphabet of punctuation tokens
//! plus identifiers. Identifiers are unescaped (`\` quotes the following
//! character) and interned through the session's [`NamePool`] as they are
//! produced, so every consumer downstream compares them by identity.
//!
//! The set of characters that terminate an identifier depends on context:
//! inside a type name `.` separates namespace segments, while inside an
//! assembly name `.` is an ordinary character ("System.Core",
//! "Version=4.0.0.0") and `=` splits key/value pairs instead. Callers select
//! the context per token via [`ScanMode`].
//!
//! The scanner supports exact rewinding through [`Scanner::snapshot`] /
//! [`Scanner::restore`]; the parser needs this at a single ambiguous
//! production and nowhere else.

use crate::intern::{Name, NamePool};

/// Token kinds of the type-name grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input
    End,
    /// An identifier (unescaped, interned)
    Identifier,
    /// `.`
    Dot,
    /// `+`
    Plus,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `*`
    Star,
    /// `,`
    Comma,
    /// `&`
    Ampersand,
    /// `=`
    Equals,
}

/// A scanned token.
#[derive(Debug, Clone)]
pub struct Token {
    /// What was scanned
    pub kind: TokenKind,
    /// Identifier text; `None` for punctuation and end-of-input
    pub text: Option<Name>,
    /// Byte offset of the token start within the input
    pub pos: usize,
}

/// Identifier-delimiter context for the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Type-name context: `.` `+` `[` `]` `*` `,` `&` delimit identifiers
    TypeName,
    /// Assembly-name context: `,` `=` `[` `]` delimit identifiers
    AssemblyName,
}

/// An immutable rewind point: cursor position plus the current token.
#[derive(Debug, Clone)]
pub struct Snapshot {
    cursor: usize,
    current: Token,
}

/// Tokenizer over a type-name string.
pub struct Scanner<'a> {
    input: &'a str,
    cursor: usize,
    current: Token,
    names: &'a NamePool,
}

impl<'a> Scanner<'a> {
    /// Create a scanner. The current token is end-of-input until the first
    /// [`Scanner::advance`] call.
    #[must_use]
    pub fn new(input: &'a str, names: &'a NamePool) -> Self {
        Scanner {
            input,
            cursor: 0,
            current: Token {
                kind: TokenKind::End,
                text: None,
                pos: 0,
            },
            names,
        }
    }

    /// The most recently scanned token.
    #[must_use]
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Capture the scanner state for a later [`Scanner::restore`].
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor: self.cursor,
            current: self.current.clone(),
        }
    }

    /// Rewind to a previously captured state.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.cursor = snapshot.cursor;
        self.current = snapshot.current;
    }

    fn is_delimiter(c: char, mode: ScanMode) -> bool {
        match mode {
            ScanMode::TypeName => matches!(c, '.' | '+' | '[' | ']' | '*' | ',' | '&'),
            ScanMode::AssemblyName => matches!(c, ',' | '=' | '[' | ']'),
        }
    }

    /// Scan the next token in the given mode, replacing the current token.
    pub fn advance(&mut self, mode: ScanMode) {
        let rest = &self.input[self.cursor..];
        let trimmed = rest.trim_start();
        self.cursor += rest.len() - trimmed.len();
        let start = self.cursor;

        let Some(first) = trimmed.chars().next() else {
            self.current = Token {
                kind: TokenKind::End,
                text: None,
                pos: start,
            };
            return;
        };

        if Self::is_delimiter(first, mode) {
            self.cursor += first.len_utf8();
            let kind = match first {
                '.' => TokenKind::Dot,
                '+' => TokenKind::Plus,
                '[' => TokenKind::OpenBracket,
                ']' => TokenKind::CloseBracket,
                '*' => TokenKind::Star,
                ',' => TokenKind::Comma,
                '&' => TokenKind::Ampersand,
                _ => TokenKind::Equals,
            };
            self.current = Token {
                kind,
                text: None,
                pos: start,
            };
            return;
        }

        // Identifier: consume until an unescaped delimiter or end of input.
        // Unescaped trailing whitespace is not part of the identifier.
        let mut text = String::new();
        let mut keep_len = 0;
        let mut consumed = trimmed.len();
        let mut chars = trimmed.char_indices();

        while let Some((offset, c)) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some((_, escaped)) => text.push(escaped),
                    None => text.push('\\'),
                }
                keep_len = text.len();
            } else if Self::is_delimiter(c, mode) {
                consumed = offset;
                break;
            } else {
                text.push(c);
                if !c.is_whitespace() {
                    keep_len = text.len();
                }
            }
        }

        text.truncate(keep_len);
        self.cursor += consumed;
        self.current = Token {
            kind: TokenKind::Identifier,
            text: Some(self.names.get_or_intern(&text)),
            pos: start,
        };
    }
}
