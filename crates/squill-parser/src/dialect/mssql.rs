//! SQL Server overlay: bracket-quoted identifiers and `SELECT TOP n`.

use std::rc::Rc;
use std::sync::Arc;

use squill_ast::{Limit, Statement};

use crate::keywords::{self, KeywordSet};
use crate::parser::{ParseError, Parser, VALUE_EXPECTED};
use crate::scanner::{LexRule, Scanner};
use crate::token::{Token, TokenKind};

#[must_use]
pub fn keywords() -> KeywordSet {
    let overlay = KeywordSet::from_phrases(&[
        &["top"],
        &["output"],
        &["nolock"],
        &["identity"],
        &["go"],
    ]);
    keywords::standard().merge(overlay)
}

#[must_use]
pub fn parser(source: impl Into<String>) -> Parser {
    let mut set = keywords();
    set.prepare();
    let set = Arc::new(set);
    let mut scan = Scanner::new(source, Arc::clone(&set));
    scan.register(Rc::new(BracketIdent));
    let mut parser = Parser::from_scanner(scan, set);
    parser.dialect = "mssql";
    parser.register_statement("SELECT", parse_select);
    parser
}

/// `[name]`-quoted identifiers.
pub struct BracketIdent;

impl LexRule for BracketIdent {
    fn can(&self, curr: u8, _peek: u8) -> bool {
        curr == b'['
    }

    fn scan(&self, scanner: &mut Scanner) -> Token {
        let pos = scanner.position();
        scanner.advance();
        let mut literal = String::new();
        loop {
            match scanner.advance() {
                Some(b']') => return Token::new(TokenKind::Ident, literal, pos),
                Some(b) => literal.push(b as char),
                None => {
                    return Token::new(
                        TokenKind::Invalid,
                        "unterminated bracket identifier",
                        pos,
                    );
                }
            }
        }
    }
}

/// `SELECT [TOP n] …` — the row cap folds into the limit clause. The cap is
/// applied to the bare select body before any `UNION`/`INTERSECT`/`EXCEPT`
/// wraps it, so a compound left-hand side keeps its TOP.
fn parse_select(p: &mut Parser) -> Result<Statement, ParseError> {
    p.next();
    let mut top = None;
    if p.is_keyword("TOP") {
        p.next();
        if !p.is(TokenKind::Number) {
            return Err(p.unexpected("top", VALUE_EXPECTED));
        }
        let count = p
            .get_curr_literal()
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| p.unexpected("top", VALUE_EXPECTED))?;
        top = Some(count);
        p.next();
    }
    let mut select = p.parse_select_body()?;
    if select.limit.is_none() {
        select.limit = top.map(|count| Limit {
            count: Some(count),
            offset: None,
        });
    }
    p.parse_compound(Statement::Select(select))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_becomes_a_limit() {
        let mut parser = parser("select top 5 name from [user table];");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        match &stmts[0] {
            Statement::Select(select) => {
                assert_eq!(
                    select.limit,
                    Some(Limit {
                        count: Some(5),
                        offset: None
                    })
                );
            }
            other => panic!("expected select, got {other:?}"),
        }
    }

    #[test]
    fn top_survives_compound_queries() {
        let expected = Some(Limit {
            count: Some(5),
            offset: None,
        });
        for op in ["union all", "intersect", "except"] {
            let sql = format!("select top 5 a from t {op} select b from u;");
            let mut parser = parser(sql);
            let (stmts, errors) = parser.parse_all();
            assert!(errors.is_empty(), "{op}: {errors:?}");
            let compound = match &stmts[0] {
                Statement::Union(c) | Statement::Intersect(c) | Statement::Except(c) => c,
                other => panic!("{op}: expected compound, got {other:?}"),
            };
            match compound.left.as_ref() {
                Statement::Select(select) => {
                    assert_eq!(select.limit, expected, "{op}: TOP lost on the left branch");
                }
                other => panic!("{op}: expected select, got {other:?}"),
            }
            match compound.right.as_ref() {
                Statement::Select(select) => assert_eq!(select.limit, None, "{op}"),
                other => panic!("{op}: expected select, got {other:?}"),
            }
        }
    }

    #[test]
    fn bracket_identifiers_lex() {
        let mut scan = crate::dialect::scanner_for("mssql", "[order details]").unwrap();
        let tok = scan.scan();
        assert_eq!(tok.kind, TokenKind::Ident);
        assert_eq!(tok.literal, "order details");
    }
}
