//! MySQL overlay: backtick-quoted identifiers and
//! `INSERT … ON DUPLICATE KEY UPDATE`.

use std::rc::Rc;
use std::sync::Arc;

use squill_ast::{Statement, Upsert};

use crate::keywords::{self, KeywordSet};
use crate::parser::{ParseError, Parser};
use crate::scanner::{LexRule, Scanner};
use crate::token::{Token, TokenKind};

#[must_use]
pub fn keywords() -> KeywordSet {
    let overlay = KeywordSet::from_phrases(&[
        &["on", "duplicate", "key", "update"],
        &["replace", "into"],
        &["low_priority"],
        &["high_priority"],
        &["straight_join"],
        &["ignore"],
    ]);
    keywords::standard().merge(overlay)
}

#[must_use]
pub fn parser(source: impl Into<String>) -> Parser {
    let mut set = keywords();
    set.prepare();
    let set = Arc::new(set);
    let mut scan = Scanner::new(source, Arc::clone(&set));
    scan.register(Rc::new(BacktickIdent));
    let mut parser = Parser::from_scanner(scan, set);
    parser.dialect = "mysql";
    parser.register_statement("INSERT INTO", parse_insert);
    parser.register_statement("REPLACE INTO", Parser::parse_insert);
    parser
}

/// `` `name` ``-quoted identifiers.
pub struct BacktickIdent;

impl LexRule for BacktickIdent {
    fn can(&self, curr: u8, _peek: u8) -> bool {
        curr == b'`'
    }

    fn scan(&self, scanner: &mut Scanner) -> Token {
        let pos = scanner.position();
        scanner.advance();
        let mut literal = String::new();
        loop {
            match scanner.advance() {
                Some(b'`') => return Token::new(TokenKind::Ident, literal, pos),
                Some(b) => literal.push(b as char),
                None => {
                    return Token::new(
                        TokenKind::Invalid,
                        "unterminated backtick identifier",
                        pos,
                    );
                }
            }
        }
    }
}

/// Standard insert plus the MySQL upsert clause, folded into the same
/// conflict representation the standard `ON CONFLICT` produces.
fn parse_insert(p: &mut Parser) -> Result<Statement, ParseError> {
    let stmt = p.parse_insert()?;
    if !p.is_keyword("ON DUPLICATE KEY UPDATE") {
        return Ok(stmt);
    }
    p.next();
    let mut assignments = Vec::new();
    loop {
        assignments.push(p.parse_assignment()?);
        if p.is(TokenKind::Comma) {
            p.next();
        } else {
            break;
        }
    }
    match stmt {
        Statement::Insert(mut insert) => {
            insert.upsert = Some(Upsert {
                columns: Vec::new(),
                action: Some(assignments),
                where_clause: None,
            });
            Ok(Statement::Insert(insert))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtick_identifiers_lex() {
        let mut scan = crate::dialect::scanner_for("mysql", "`select`").unwrap();
        let tok = scan.scan();
        assert_eq!(tok.kind, TokenKind::Ident);
        assert_eq!(tok.literal, "select");
    }

    #[test]
    fn on_duplicate_key_update_becomes_upsert() {
        let mut parser = parser("insert into t (a) values (1) on duplicate key update a = 2;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        match &stmts[0] {
            Statement::Insert(insert) => {
                let upsert = insert.upsert.as_ref().expect("upsert");
                assert_eq!(upsert.action.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }
}
