//! SQL scanner.
//!
//! Byte-based over owned input (include frames hand whole sources around),
//! with line/column/offset tracking. Comments are real tokens, not skipped:
//! the parser attaches them to statements. Identifier words are probed
//! against the active [`KeywordSet`] with bounded look-ahead so multi-word
//! keywords come out as a single token.

use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use memchr::memchr;
use squill_ast::Position;

use crate::keywords::KeywordSet;
use crate::token::{Token, TokenKind};

/// Maximum number of look-ahead words collected for a keyword probe.
/// The longest standard phrase is four words; dialects stay under six.
pub const K_MAX: usize = 6;

/// A pluggable lexing hook. When [`LexRule::can`] matches the current byte
/// pair the rule takes over scanning the next token. Dialects use this for
/// non-standard identifier forms.
pub trait LexRule {
    fn can(&self, curr: u8, peek: u8) -> bool;
    fn scan(&self, scanner: &mut Scanner) -> Token;
}

struct RawTok {
    tok: Token,
    /// Whether this is a bare identifier word eligible for keyword probing.
    word: bool,
}

/// The SQL scanner. One per input stream; not shared across threads. The
/// keyword set is immutable once prepared and is shared between frames.
pub struct Scanner {
    src: Vec<u8>,
    pos: usize,
    line: u32,
    col: u32,
    keywords: Arc<KeywordSet>,
    rules: Vec<Rc<dyn LexRule>>,
    pending: VecDeque<RawTok>,
}

impl Scanner {
    #[must_use]
    pub fn new(source: impl Into<String>, keywords: Arc<KeywordSet>) -> Self {
        Self {
            src: source.into().into_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            keywords,
            rules: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Register a dialect lexing hook. Rules are consulted in registration
    /// order before the built-in token forms.
    pub fn register(&mut self, rule: Rc<dyn LexRule>) {
        self.rules.push(rule);
    }

    /// Produce the next token.
    pub fn scan(&mut self) -> Token {
        let raw = self
            .pending
            .pop_front()
            .unwrap_or_else(|| self.scan_raw());
        if raw.word {
            self.probe_keyword(raw)
        } else {
            raw.tok
        }
    }

    // -- keyword probing ----------------------------------------------------

    fn ensure_pending(&mut self, n: usize) {
        while self.pending.len() < n {
            let raw = self.scan_raw();
            self.pending.push_back(raw);
        }
    }

    /// Probe the keyword set starting at an already-consumed word, pulling
    /// further look-ahead words from the pending queue. The longest matching
    /// phrase wins; consumed look-ahead words are dropped from the queue.
    fn probe_keyword(&mut self, first: RawTok) -> Token {
        let mut words = vec![first.tok.literal.clone()];
        let mut ahead = 0;
        while words.len() < K_MAX {
            self.ensure_pending(ahead + 1);
            match self.pending.get(ahead) {
                Some(raw) if raw.word => {
                    words.push(raw.tok.literal.clone());
                    ahead += 1;
                }
                _ => break,
            }
        }
        for n in (1..=words.len()).rev() {
            let slice: Vec<&str> = words[..n].iter().map(String::as_str).collect();
            let (phrase, _, ok) = self.keywords.is(&slice);
            if ok {
                for _ in 1..n {
                    self.pending.pop_front();
                }
                return Token::new(TokenKind::Keyword, phrase.to_uppercase(), first.tok.pos);
            }
        }
        first.tok
    }

    // -- low-level helpers shared with lex rules ---------------------------

    #[must_use]
    pub fn done(&self) -> bool {
        self.pos >= self.src.len()
    }

    #[must_use]
    pub fn current(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    #[must_use]
    pub fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.line, self.col, self.pos)
    }

    /// Consume and return the current byte.
    pub fn advance(&mut self) -> Option<u8> {
        let b = self.current()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    // -- raw token scanning -------------------------------------------------

    fn scan_raw(&mut self) -> RawTok {
        self.skip_whitespace();

        let pos = self.position();
        let Some(c) = self.current() else {
            return plain(Token::eof(pos));
        };
        let peek = self.peek_byte().unwrap_or(0);

        if let Some(i) = (0..self.rules.len()).find(|&i| self.rules[i].can(c, peek)) {
            let rule = Rc::clone(&self.rules[i]);
            return plain(rule.scan(self));
        }

        match c {
            b'\'' | b'"' => plain(self.scan_string(pos, c)),
            b'0'..=b'9' => plain(self.scan_number(pos)),
            _ if is_ident_start(c) => self.scan_word(pos),
            b'?' => {
                self.advance();
                plain(Token::new(TokenKind::Placeholder, "?", pos))
            }
            b':' => plain(self.scan_named_holder(pos)),
            b'$' => plain(self.scan_position_holder(pos)),
            b'#' => plain(self.scan_macro(pos)),
            b'-' if peek == b'-' => plain(self.scan_line_comment(pos)),
            b'/' if peek == b'*' => plain(self.scan_block_comment(pos)),
            b'-' if peek == b'>' => {
                self.advance_n(2);
                plain(Token::new(TokenKind::Arrow, "->", pos))
            }
            b'|' if peek == b'|' => {
                self.advance_n(2);
                plain(Token::new(TokenKind::Concat, "||", pos))
            }
            b'<' => {
                self.advance();
                match self.current() {
                    Some(b'=') => {
                        self.advance();
                        plain(Token::new(TokenKind::Le, "<=", pos))
                    }
                    Some(b'>') => {
                        self.advance();
                        plain(Token::new(TokenKind::Ne, "<>", pos))
                    }
                    _ => plain(Token::new(TokenKind::Lt, "<", pos)),
                }
            }
            b'>' => {
                self.advance();
                if self.current() == Some(b'=') {
                    self.advance();
                    plain(Token::new(TokenKind::Ge, ">=", pos))
                } else {
                    plain(Token::new(TokenKind::Gt, ">", pos))
                }
            }
            b'!' => {
                self.advance();
                if self.current() == Some(b'=') {
                    self.advance();
                    plain(Token::new(TokenKind::Ne, "<>", pos))
                } else {
                    plain(Token::new(TokenKind::Invalid, "!", pos))
                }
            }
            _ => {
                self.advance();
                let kind = match c {
                    b'(' => TokenKind::Lparen,
                    b')' => TokenKind::Rparen,
                    b',' => TokenKind::Comma,
                    b'.' => TokenKind::Dot,
                    b';' => TokenKind::Eol,
                    b'+' => TokenKind::Plus,
                    b'-' => TokenKind::Minus,
                    b'*' => TokenKind::Star,
                    b'/' => TokenKind::Slash,
                    b'=' => TokenKind::Eq,
                    b'|' => TokenKind::Invalid,
                    _ => TokenKind::Invalid,
                };
                plain(Token::new(kind, (c as char).to_string(), pos))
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self
            .current()
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.advance();
        }
    }

    fn scan_word(&mut self, pos: Position) -> RawTok {
        let start = self.pos;
        self.advance();
        while self.current().is_some_and(is_ident_byte) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        RawTok {
            tok: Token::new(TokenKind::Ident, text, pos),
            word: true,
        }
    }

    /// Scan a quoted string with doubled-quote escape, memchr-accelerated.
    fn scan_string(&mut self, pos: Position, quote: u8) -> Token {
        self.advance();
        let mut value = String::new();
        loop {
            let rest = &self.src[self.pos..];
            match memchr(quote, rest) {
                Some(offset) => {
                    value.push_str(&String::from_utf8_lossy(&rest[..offset]));
                    self.advance_n(offset + 1);
                    if self.current() == Some(quote) {
                        value.push(quote as char);
                        self.advance();
                    } else {
                        return Token::new(TokenKind::Literal, value, pos);
                    }
                }
                None => {
                    self.advance_n(rest.len());
                    return Token::new(TokenKind::Invalid, "unterminated string literal", pos);
                }
            }
        }
    }

    fn scan_number(&mut self, pos: Position) -> Token {
        let start = self.pos;
        while self.current().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        if self.current() == Some(b'.') && self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
            while self.current().is_some_and(|b| b.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.current(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.advance();
            if matches!(self.current(), Some(b'+' | b'-')) {
                self.advance();
            }
            if self.current().is_some_and(|b| b.is_ascii_digit()) {
                while self.current().is_some_and(|b| b.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                // Not an exponent after all; rewind to before the 'e'.
                self.col -= (self.pos - mark) as u32;
                self.pos = mark;
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        Token::new(TokenKind::Number, text, pos)
    }

    fn scan_named_holder(&mut self, pos: Position) -> Token {
        self.advance();
        let start = self.pos;
        while self.current().is_some_and(is_ident_byte) {
            self.advance();
        }
        if self.pos == start {
            return Token::new(TokenKind::Invalid, "empty placeholder name", pos);
        }
        let name = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        Token::new(TokenKind::NamedHolder, name, pos)
    }

    fn scan_position_holder(&mut self, pos: Position) -> Token {
        self.advance();
        let start = self.pos;
        while self.current().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == start {
            return Token::new(TokenKind::Invalid, "empty placeholder position", pos);
        }
        let num = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        Token::new(TokenKind::PositionHolder, num, pos)
    }

    fn scan_macro(&mut self, pos: Position) -> Token {
        self.advance();
        let start = self.pos;
        while self.current().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.advance();
        }
        let word = String::from_utf8_lossy(&self.src[start..self.pos]).to_uppercase();
        Token::new(TokenKind::Macro, word, pos)
    }

    fn scan_line_comment(&mut self, pos: Position) -> Token {
        self.advance_n(2);
        let start = self.pos;
        while self.current().is_some_and(|b| b != b'\n') {
            self.advance();
        }
        let body = String::from_utf8_lossy(&self.src[start..self.pos])
            .trim()
            .to_string();
        Token::new(TokenKind::Comment, body, pos)
    }

    fn scan_block_comment(&mut self, pos: Position) -> Token {
        self.advance_n(2);
        let start = self.pos;
        let mut depth = 1u32;
        while depth > 0 {
            match (self.current(), self.peek_byte()) {
                (Some(b'/'), Some(b'*')) => {
                    self.advance_n(2);
                    depth += 1;
                }
                (Some(b'*'), Some(b'/')) => {
                    depth -= 1;
                    if depth == 0 {
                        let body = String::from_utf8_lossy(&self.src[start..self.pos])
                            .trim()
                            .to_string();
                        self.advance_n(2);
                        return Token::new(TokenKind::Comment, body, pos);
                    }
                    self.advance_n(2);
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => {
                    return Token::new(TokenKind::Invalid, "unterminated block comment", pos);
                }
            }
        }
        unreachable!("block comment loop exits via return")
    }
}

fn plain(tok: Token) -> RawTok {
    RawTok { tok, word: false }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Whether a byte can appear in a bare identifier. Exposed for lex rules.
#[must_use]
pub fn is_letter(b: u8) -> bool {
    is_ident_byte(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords;

    fn scanner(src: &str) -> Scanner {
        let mut set = keywords::standard();
        set.prepare();
        Scanner::new(src, Arc::new(set))
    }

    fn all_tokens(src: &str) -> Vec<Token> {
        let mut scan = scanner(src);
        let mut out = Vec::new();
        loop {
            let tok = scan.scan();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        all_tokens(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scan_single_keywords() {
        let toks = all_tokens("select from where");
        assert_eq!(toks[0].kind, TokenKind::Keyword);
        assert_eq!(toks[0].literal, "SELECT");
        assert_eq!(toks[1].literal, "FROM");
        assert_eq!(toks[2].literal, "WHERE");
    }

    #[test]
    fn scan_multi_word_keywords() {
        let toks = all_tokens("group by order by create or replace procedure");
        assert_eq!(toks[0].literal, "GROUP BY");
        assert_eq!(toks[1].literal, "ORDER BY");
        assert_eq!(toks[2].literal, "CREATE OR REPLACE PROCEDURE");
        assert_eq!(toks[3].kind, TokenKind::Eof);
    }

    #[test]
    fn longest_phrase_wins() {
        let toks = all_tokens("left outer join t");
        assert_eq!(toks[0].literal, "LEFT OUTER JOIN");
        assert_eq!(toks[1].kind, TokenKind::Ident);
        assert_eq!(toks[1].literal, "t");
    }

    #[test]
    fn prefix_words_fall_back_to_shorter_phrase() {
        // "primary" alone is only a phrase prefix; with "key" it matches.
        let toks = all_tokens("primary key id");
        assert_eq!(toks[0].kind, TokenKind::Keyword);
        assert_eq!(toks[0].literal, "PRIMARY KEY");
        assert_eq!(toks[1].kind, TokenKind::Ident);
    }

    #[test]
    fn leftover_probe_words_are_rescanned() {
        // "release" is a keyword; the non-matching tail "savepoint" must
        // itself come back as the SAVEPOINT keyword.
        let toks = all_tokens("release savepoint sp1");
        assert_eq!(toks[0].literal, "RELEASE SAVEPOINT");
        assert_eq!(toks[1].kind, TokenKind::Ident);
        assert_eq!(toks[1].literal, "sp1");
    }

    #[test]
    fn idents_and_punctuation() {
        let toks = all_tokens("select e.dept, count(e.id) from employees e;");
        let literals: Vec<&str> = toks.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(
            literals,
            vec![
                "SELECT", "e", ".", "dept", ",", "count", "(", "e", ".", "id", ")", "FROM",
                "employees", "e", ";", ""
            ]
        );
        assert_eq!(toks[14].kind, TokenKind::Eol);
    }

    #[test]
    fn operators() {
        let toks = kinds("+ - * / = <> != < <= > >= || ->");
        assert_eq!(
            toks,
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Concat,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bang_equals_normalises_to_ne() {
        let toks = all_tokens("a != b");
        assert_eq!(toks[1].kind, TokenKind::Ne);
        assert_eq!(toks[1].literal, "<>");
    }

    #[test]
    fn string_literals_with_escapes() {
        let toks = all_tokens("'it''s' \"two\"");
        assert_eq!(toks[0].kind, TokenKind::Literal);
        assert_eq!(toks[0].literal, "it's");
        assert_eq!(toks[1].kind, TokenKind::Literal);
        assert_eq!(toks[1].literal, "two");
    }

    #[test]
    fn unterminated_string_is_invalid() {
        let toks = all_tokens("'oops");
        assert_eq!(toks[0].kind, TokenKind::Invalid);
    }

    #[test]
    fn numbers() {
        let toks = all_tokens("42 3.14 1e10 2.5e-3");
        assert!(toks[..4].iter().all(|t| t.kind == TokenKind::Number));
        assert_eq!(toks[0].literal, "42");
        assert_eq!(toks[1].literal, "3.14");
        assert_eq!(toks[2].literal, "1e10");
        assert_eq!(toks[3].literal, "2.5e-3");
    }

    #[test]
    fn placeholders() {
        let toks = all_tokens("? :name $2");
        assert_eq!(toks[0].kind, TokenKind::Placeholder);
        assert_eq!(toks[1].kind, TokenKind::NamedHolder);
        assert_eq!(toks[1].literal, "name");
        assert_eq!(toks[2].kind, TokenKind::PositionHolder);
        assert_eq!(toks[2].literal, "2");
    }

    #[test]
    fn comments_are_tokens() {
        let toks = all_tokens("-- leading\nselect 1 /* inline */;");
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[0].literal, "leading");
        assert_eq!(toks[1].literal, "SELECT");
        assert_eq!(toks[3].kind, TokenKind::Comment);
        assert_eq!(toks[3].literal, "inline");
    }

    #[test]
    fn macro_token() {
        let toks = all_tokens("#INCLUDE 'other.sql';");
        assert_eq!(toks[0].kind, TokenKind::Macro);
        assert_eq!(toks[0].literal, "INCLUDE");
        assert_eq!(toks[1].kind, TokenKind::Literal);
        assert_eq!(toks[2].kind, TokenKind::Eol);
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let toks = all_tokens("select\n  a\nfrom t");
        assert_eq!(toks[0].pos, Position::new(1, 1, 0));
        assert_eq!(toks[1].pos.line, 2);
        assert_eq!(toks[1].pos.column, 3);
        assert_eq!(toks[2].pos.line, 3);
    }

    #[test]
    fn utf8_identifiers() {
        let toks = all_tokens("select prénom from tâble");
        assert_eq!(toks[1].kind, TokenKind::Ident);
        assert_eq!(toks[1].literal, "prénom");
        assert_eq!(toks[3].literal, "tâble");
    }

    #[test]
    fn round_trip_token_stream() {
        let src = "select a, b from t where x >= 10 and y in (1, 2) group by a;";
        let first = all_tokens(src);
        let rendered: Vec<String> = first
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| match t.kind {
                TokenKind::Literal => format!("'{}'", t.literal.replace('\'', "''")),
                _ => t.literal.clone(),
            })
            .collect();
        let second = all_tokens(&rendered.join(" "));
        let strip = |toks: &[Token]| -> Vec<(TokenKind, String)> {
            toks.iter()
                .filter(|t| t.kind != TokenKind::Comment)
                .map(|t| (t.kind, t.literal.clone()))
                .collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }
}
