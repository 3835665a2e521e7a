//! A forgiving C# tokenizer.
//!
//! Only as precise as layout needs: it must find every brace, paren and bracket that is not inside
//! a literal or comment, and it must know where multi-line literals start and end. Whitespace is
//! not tokenized. Anything unrecognized becomes a one-character [`TokenKind::Punct`].

use std::ops::Range;

/// String literal flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringStyle {
    /// `"..."`.
    Regular,
    /// `@"..."`.
    Verbatim,
    /// `$"..."`, `$@"..."`.
    Interpolated,
    /// `"""..."""`, `$"""..."""`.
    Raw,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or keyword, including `@class`.
    Identifier,
    /// Numeric literal.
    Number,
    /// String literal.
    String(StringStyle),
    /// Character literal.
    Char,
    /// `// ...` (without the line break).
    LineComment,
    /// `/* ... */`.
    BlockComment,
    /// A single punctuation character.
    Punct(char),
}

/// A token with its character range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Kind.
    pub kind: TokenKind,
    /// Character range in the tokenized text.
    pub range: Range<usize>,
}

impl Token {
    /// Returns `true` for comments.
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Returns `true` if this is the punctuation `ch`.
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }
}

/// Tokenize `chars`.
pub fn tokenize(chars: &[char]) -> Vec<Token> {
    let mut lexer = Lexer { chars, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
}

impl Lexer<'_> {
    fn at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    fn next_token(&mut self) -> Option<Token> {
        while self.at(self.pos)?.is_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        let (kind, end) = self.scan(start);
        self.pos = end.max(start + 1);
        Some(Token {
            kind,
            range: start..self.pos,
        })
    }

    fn scan(&self, i: usize) -> (TokenKind, usize) {
        let len = self.chars.len();
        let c0 = self.chars[i];
        let c1 = self.at(i + 1);
        let c2 = self.at(i + 2);
        let c3 = self.at(i + 3);
        match (c0, c1, c2) {
            ('/', Some('/'), _) => {
                let mut end = self.find_char(i, '\n').unwrap_or(len);
                if end > i + 2 && self.chars[end - 1] == '\r' {
                    end -= 1;
                }
                (TokenKind::LineComment, end)
            }
            ('/', Some('*'), _) => (
                TokenKind::BlockComment,
                self.find(i + 2, &['*', '/']).map_or(len, |close| close + 2),
            ),
            ('"', Some('"'), Some('"')) => (TokenKind::String(StringStyle::Raw), self.raw_end(i + 3)),
            ('$', Some('"'), Some('"')) if c3 == Some('"') => {
                (TokenKind::String(StringStyle::Raw), self.raw_end(i + 4))
            }
            ('"', _, _) => (
                TokenKind::String(StringStyle::Regular),
                self.regular_end(i + 1, '"'),
            ),
            ('\'', _, _) => (TokenKind::Char, self.regular_end(i + 1, '\'')),
            ('@', Some('"'), _) => (
                TokenKind::String(StringStyle::Verbatim),
                self.verbatim_end(i + 2),
            ),
            ('$', Some('@'), Some('"')) | ('@', Some('$'), Some('"')) => (
                TokenKind::String(StringStyle::Interpolated),
                self.verbatim_end(i + 3),
            ),
            ('$', Some('"'), _) => (
                TokenKind::String(StringStyle::Interpolated),
                self.interpolated_end(i + 2),
            ),
            ('@', Some(c), _) if is_ident_start(c) => {
                (TokenKind::Identifier, self.ident_end(i + 1))
            }
            (c, _, _) if is_ident_start(c) => (TokenKind::Identifier, self.ident_end(i)),
            (c, _, _) if c.is_ascii_digit() => {
                let mut end = i;
                while self
                    .at(end)
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
                {
                    end += 1;
                }
                (TokenKind::Number, end)
            }
            (c, _, _) => (TokenKind::Punct(c), i + 1),
        }
    }

    fn ident_end(&self, mut i: usize) -> usize {
        while self.at(i).is_some_and(|c| c.is_alphanumeric() || c == '_') {
            i += 1;
        }
        i
    }

    fn find_char(&self, from: usize, ch: char) -> Option<usize> {
        (from..self.chars.len()).find(|&i| self.chars[i] == ch)
    }

    fn find(&self, from: usize, pattern: &[char]) -> Option<usize> {
        (from..self.chars.len())
            .find(|&i| self.chars[i..].starts_with(pattern))
    }

    fn raw_end(&self, from: usize) -> usize {
        self.find(from, &['"', '"', '"'])
            .map_or(self.chars.len(), |close| close + 3)
    }

    /// End of a `"` or `'` literal whose body starts at `from`; a line break ends it unterminated.
    fn regular_end(&self, from: usize, quote: char) -> usize {
        let mut i = from;
        while let Some(ch) = self.at(i) {
            match ch {
                '\\' => i += 2,
                '\n' => return i,
                c if c == quote => return i + 1,
                _ => i += 1,
            }
        }
        self.chars.len()
    }

    fn verbatim_end(&self, from: usize) -> usize {
        let mut i = from;
        while let Some(ch) = self.at(i) {
            if ch == '"' {
                if self.at(i + 1) == Some('"') {
                    i += 2;
                    continue;
                }
                return i + 1;
            }
            i += 1;
        }
        self.chars.len()
    }

    /// `$"text {expr} text"`; holes may contain nested string literals.
    fn interpolated_end(&self, from: usize) -> usize {
        let mut i = from;
        let mut holes = 0usize;
        while let Some(ch) = self.at(i) {
            match ch {
                '{' if holes == 0 && self.at(i + 1) == Some('{') => i += 2,
                '}' if holes == 0 && self.at(i + 1) == Some('}') => i += 2,
                '{' => {
                    holes += 1;
                    i += 1;
                }
                '}' => {
                    holes = holes.saturating_sub(1);
                    i += 1;
                }
                '"' if holes > 0 => i = self.regular_end(i + 1, '"'),
                '\\' if holes == 0 => i += 2,
                '"' => return i + 1,
                '\n' if holes == 0 => return i,
                _ => i += 1,
            }
        }
        self.chars.len()
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}
