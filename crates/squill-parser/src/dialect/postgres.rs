//! PostgreSQL overlay: locking/sampling keywords and the `SET … TO …`
//! spelling of configuration assignment.

use squill_ast::{Name, SetStatement, Statement};

use crate::keywords::{self, KeywordSet};
use crate::parser::{ParseError, Parser};
use crate::token::TokenKind;

#[must_use]
pub fn keywords() -> KeywordSet {
    let overlay = KeywordSet::from_phrases(&[
        &["distinct", "on"],
        &["lateral"],
        &["tablesample"],
        &["for", "update"],
        &["for", "share"],
        &["nowait"],
        &["skip", "locked"],
        &["concurrently"],
    ]);
    keywords::standard().merge(overlay)
}

#[must_use]
pub fn parser(source: impl Into<String>) -> Parser {
    let mut parser = Parser::with_keywords(source, keywords());
    parser.dialect = "postgres";
    parser.register_statement("SET", parse_set);
    parser
}

/// `SET name = value` or the PostgreSQL-specific `SET name TO value`.
fn parse_set(p: &mut Parser) -> Result<Statement, ParseError> {
    p.next();
    let ident = match p.parse_identifier()? {
        Statement::Name(name) => name,
        _ => Name::default(),
    };
    if p.is_keyword("TO") {
        p.next();
    } else {
        p.expect("set", TokenKind::Eq)?;
    }
    let value = p.start_expression()?;
    Ok(Statement::Set(SetStatement {
        ident,
        value: Box::new(value),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_accepts_both_spellings() {
        let mut parser = parser("set search_path to public;\nset work_mem = 64;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(stmts.len(), 2);
        match &stmts[0] {
            Statement::Set(set) => assert_eq!(set.ident.ident(), "search_path"),
            other => panic!("expected set, got {other:?}"),
        }
    }

    #[test]
    fn truncate_identity_and_cascade() {
        let mut parser = parser("truncate table t1, t2 restart identity cascade;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        match &stmts[0] {
            Statement::Truncate(t) => {
                assert_eq!(t.tables.len(), 2);
                assert_eq!(t.identity.as_deref(), Some("restart"));
                assert!(t.cascade);
            }
            other => panic!("expected truncate, got {other:?}"),
        }
    }
}
