//! SQLite overlay: conflict-resolution insert spellings and transaction
//! syntax.

use squill_ast::{Statement, TransactionStatement};

use crate::keywords::{self, KeywordSet};
use crate::parser::{ParseError, Parser};

#[must_use]
pub fn keywords() -> KeywordSet {
    let overlay = KeywordSet::from_phrases(&[
        &["collate"],
        &["replace", "into"],
        &["insert", "or", "abort", "into"],
        &["insert", "or", "fail", "into"],
        &["insert", "or", "ignore", "into"],
        &["insert", "or", "replace", "into"],
        &["insert", "or", "rollback", "into"],
        &["update", "or", "abort"],
        &["update", "or", "fail"],
        &["update", "or", "ignore"],
        &["update", "or", "replace"],
        &["update", "or", "rollback"],
        &["vacuum"],
        &["into"],
        &["begin"],
        &["deferred"],
        &["immediate"],
        &["exclusive"],
        &["transaction"],
        &["rollback"],
        &["fail"],
        &["abort"],
        &["ignore"],
        &["replace"],
        &["strict"],
        &["without", "rowid"],
    ]);
    keywords::standard().merge(overlay)
}

#[must_use]
pub fn parser(source: impl Into<String>) -> Parser {
    let mut parser = Parser::with_keywords(source, keywords());
    parser.dialect = "sqlite";
    for phrase in [
        "REPLACE INTO",
        "INSERT OR ABORT INTO",
        "INSERT OR FAIL INTO",
        "INSERT OR IGNORE INTO",
        "INSERT OR REPLACE INTO",
        "INSERT OR ROLLBACK INTO",
    ] {
        parser.register_statement(phrase, Parser::parse_insert);
    }
    for phrase in [
        "UPDATE OR ABORT",
        "UPDATE OR FAIL",
        "UPDATE OR IGNORE",
        "UPDATE OR REPLACE",
        "UPDATE OR ROLLBACK",
    ] {
        parser.register_statement(phrase, Parser::parse_update);
    }
    parser.register_statement("BEGIN", parse_begin);
    parser
}

/// `BEGIN [DEFERRED|IMMEDIATE|EXCLUSIVE] [TRANSACTION]` opens a transaction;
/// a bare `BEGIN` still opens a compound statement body.
fn parse_begin(p: &mut Parser) -> Result<Statement, ParseError> {
    let mode = ["DEFERRED", "IMMEDIATE", "EXCLUSIVE"]
        .into_iter()
        .find(|m| p.peek_is_keyword(m))
        .map(String::from);
    if mode.is_none() && !p.peek_is_keyword("TRANSACTION") {
        return p.parse_begin();
    }
    p.next();
    let mut modes = Vec::new();
    if let Some(mode) = mode {
        modes.push(mode);
        p.next();
    }
    if p.is_keyword("TRANSACTION") {
        p.next();
    }
    Ok(Statement::StartTransaction(TransactionStatement { modes }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_into_parses_as_insert() {
        let mut parser = parser("replace into t (a, b) values (1, 2);");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(stmts[0], Statement::Insert(_)));
    }

    #[test]
    fn insert_or_ignore_parses_as_insert() {
        let mut parser = parser("insert or ignore into t values (1);");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(stmts[0], Statement::Insert(_)));
    }

    #[test]
    fn begin_transaction_modes() {
        let mut parser = parser("begin immediate transaction;\ncommit;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        match &stmts[0] {
            Statement::StartTransaction(t) => {
                assert_eq!(t.modes, vec!["IMMEDIATE".to_string()]);
            }
            other => panic!("expected transaction, got {other:?}"),
        }
        assert_eq!(stmts[1], Statement::Commit);
    }

    #[test]
    fn bare_begin_still_opens_a_body() {
        let mut parser = parser("begin select 1; end;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(&stmts[0], Statement::Begin(body) if body.len() == 1));
    }
}
