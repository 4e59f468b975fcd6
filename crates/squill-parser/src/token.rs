//! SQL token types.
//!
//! Unlike lexers that bake every keyword into the token discriminant, the
//! scanner here is keyword-set driven: a `Keyword` token carries the
//! canonical upper-case phrase (`"GROUP BY"`, `"CREATE OR REPLACE
//! PROCEDURE"`) as its literal, so dialects can extend the keyword
//! vocabulary without touching the token model.

use squill_ast::Position;
use std::fmt;

/// Token discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Unquoted or dialect-quoted identifier.
    Ident,
    /// An upper-case keyword phrase from the active keyword set.
    Keyword,
    /// String literal (quotes stripped, doubled-quote escapes resolved).
    Literal,
    /// Numeric literal (integer, decimal, optional exponent).
    Number,
    /// Anonymous `?` placeholder.
    Placeholder,
    /// `:name` placeholder; the literal is the name.
    NamedHolder,
    /// `$n` placeholder; the literal is the position.
    PositionHolder,
    /// `--` or `/* */` comment; the literal is the trimmed body.
    Comment,
    /// `#WORD` macro introducer; the literal is the upper-cased word.
    Macro,

    Lparen,
    Rparen,
    Comma,
    Dot,
    Star,

    Plus,
    Minus,
    Slash,
    Eq,
    /// `<>` or `!=`.
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `||`.
    Concat,
    /// `->`, used for named procedure arguments.
    Arrow,

    /// Statement terminator `;`.
    Eol,
    /// End of the input stream.
    Eof,
    /// Lexically invalid input at this position.
    Invalid,
}

/// A scanned token: discriminant, source literal and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub pos: Position,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, literal: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            pos,
        }
    }

    #[must_use]
    pub fn eof(pos: Position) -> Self {
        Self::new(TokenKind::Eof, "", pos)
    }

    /// Whether the token can stand for a value-ish item in column lists and
    /// aliases (identifier, string literal or number).
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Ident | TokenKind::Literal | TokenKind::Number
        )
    }

    /// The handler-table key for this token. Keywords are distinguished by
    /// their phrase; every other kind maps to a literal-less symbol.
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        match self.kind {
            TokenKind::Keyword => Symbol::keyword(&self.literal),
            kind => Symbol::of(kind),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("<eof>"),
            TokenKind::Eol => f.write_str(";"),
            TokenKind::Literal => write!(f, "'{}'", self.literal),
            _ => f.write_str(&self.literal),
        }
    }
}

/// Key for the prefix/infix handler tables: a token kind plus, for keywords
/// only, the keyword phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub kind: TokenKind,
    pub literal: String,
}

impl Symbol {
    /// A symbol for a non-keyword token kind.
    #[must_use]
    pub fn of(kind: TokenKind) -> Self {
        Self {
            kind,
            literal: String::new(),
        }
    }

    /// A symbol for a specific keyword phrase.
    #[must_use]
    pub fn keyword(phrase: &str) -> Self {
        Self {
            kind: TokenKind::Keyword,
            literal: phrase.to_ascii_uppercase(),
        }
    }
}

/// Well-known keyword constants used as token literals.
pub mod kw {
    pub const TRUE: &str = "TRUE";
    pub const FALSE: &str = "FALSE";
    pub const UNKNOWN: &str = "UNKNOWN";
    pub const NULL: &str = "NULL";
    pub const DEFAULT: &str = "DEFAULT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_symbols_carry_their_phrase() {
        let tok = Token::new(TokenKind::Keyword, "GROUP BY", Position::default());
        assert_eq!(tok.symbol(), Symbol::keyword("group by"));

        let tok = Token::new(TokenKind::Plus, "+", Position::default());
        assert_eq!(tok.symbol(), Symbol::of(TokenKind::Plus));
        assert!(tok.symbol().literal.is_empty());
    }

    #[test]
    fn value_tokens() {
        let ident = Token::new(TokenKind::Ident, "x", Position::default());
        let num = Token::new(TokenKind::Number, "1", Position::default());
        let comma = Token::new(TokenKind::Comma, ",", Position::default());
        assert!(ident.is_value());
        assert!(num.is_value());
        assert!(!comma.is_value());
    }
}
