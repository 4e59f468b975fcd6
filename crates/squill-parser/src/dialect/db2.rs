//! Db2 overlay: stored-procedure clauses, `SET OPTION`, and leading-star
//! identifiers in procedure bodies.

use std::rc::Rc;
use std::sync::Arc;

use squill_ast::{
    Assignment, CreateProcedureStatement, DataAccess, Name, Statement,
};

use crate::keywords::{self, KeywordSet};
use crate::parser::{keyword_expected, ParseError, Parser, IDENT_EXPECTED};
use crate::scanner::{is_letter, LexRule, Scanner};
use crate::token::{Token, TokenKind};

/// The Db2 keyword corpus layered over the standard set.
#[must_use]
pub fn keywords() -> KeywordSet {
    let overlay = KeywordSet::from_phrases(&[
        &["label", "on"],
        &["set", "option"],
        &["reads", "sql", "data"],
        &["modifies", "sql", "data"],
        &["contains", "sql"],
        &["deterministic"],
        &["not", "deterministic"],
        &["specific"],
        &["called", "on", "null", "input"],
        &["execute"],
        &["execute", "immediate"],
        &["exit", "handler", "for"],
        &["continue", "handler", "for"],
        &["undo", "handler", "for"],
        &["signal"],
        &["resignal"],
    ]);
    keywords::standard().merge(overlay)
}

/// Build a Db2 parser: merged keywords, star-identifier lexing, and the
/// procedure-definition override.
#[must_use]
pub fn parser(source: impl Into<String>) -> Parser {
    let mut set = keywords();
    set.prepare();
    let set = Arc::new(set);
    let mut scan = Scanner::new(source, Arc::clone(&set));
    scan.register(Rc::new(StarIdent));
    let mut parser = Parser::from_scanner(scan, set);
    parser.dialect = "db2";
    parser.register_statement("CREATE PROCEDURE", parse_create_procedure);
    parser.register_statement("CREATE OR REPLACE PROCEDURE", parse_create_procedure);
    parser
}

/// Db2 register-style identifiers like `*sql` lex as plain identifiers.
pub struct StarIdent;

impl LexRule for StarIdent {
    fn can(&self, curr: u8, peek: u8) -> bool {
        curr == b'*' && is_letter(peek)
    }

    fn scan(&self, scanner: &mut Scanner) -> Token {
        let pos = scanner.position();
        let mut literal = String::from("*");
        scanner.advance();
        while !scanner.done() && scanner.current().is_some_and(is_letter) {
            literal.push(scanner.advance().unwrap_or(b'_') as char);
        }
        Token::new(TokenKind::Ident, literal, pos)
    }
}

fn parse_create_procedure(p: &mut Parser) -> Result<Statement, ParseError> {
    let replace = p.get_curr_literal().contains("OR REPLACE");
    p.next();
    if !p.is(TokenKind::Ident) {
        return Err(p.unexpected("procedure", IDENT_EXPECTED));
    }
    let mut stmt = CreateProcedureStatement {
        replace,
        name: p.get_curr_literal(),
        parameters: Vec::new(),
        language: None,
        deterministic: None,
        data_access: None,
        null_input: false,
        options: Vec::new(),
        body: Vec::new(),
    };
    p.next();
    stmt.parameters = p.parse_procedure_parameters()?;
    if p.is_keyword("LANGUAGE") {
        p.next();
        stmt.language = Some(p.get_curr_literal());
        p.next();
    }
    if p.is_keyword("DETERMINISTIC") || p.is_keyword("NOT DETERMINISTIC") {
        stmt.deterministic = Some(p.is_keyword("DETERMINISTIC"));
        p.next();
    }
    if p.is_keyword("MODIFIES SQL DATA") {
        stmt.data_access = Some(DataAccess::ModifiesSql);
        p.next();
    } else if p.is_keyword("READS SQL DATA") {
        stmt.data_access = Some(DataAccess::ReadsSql);
        p.next();
    } else if p.is_keyword("CONTAINS SQL") {
        stmt.data_access = Some(DataAccess::ContainsSql);
        p.next();
    }
    if p.is_keyword("CALLED ON NULL INPUT") {
        stmt.null_input = true;
        p.next();
    }
    if p.is_keyword("SET OPTION") {
        p.next();
        stmt.options = parse_procedure_options(p)?;
    }
    if !p.is_keyword("BEGIN") {
        return Err(p.unexpected("procedure", keyword_expected("BEGIN")));
    }
    p.next();
    stmt.body = p.parse_body_until(&["END"])?;
    p.next();
    Ok(Statement::CreateProcedure(stmt))
}

fn parse_procedure_options(p: &mut Parser) -> Result<Vec<Assignment>, ParseError> {
    let mut options = Vec::new();
    while !p.done() && p.peek_is(TokenKind::Eq) {
        if !p.is(TokenKind::Ident) && !p.is(TokenKind::Keyword) {
            return Err(p.unexpected("set option", IDENT_EXPECTED));
        }
        let key = Statement::Name(Name::bare(p.get_curr_literal()));
        p.next();
        p.expect("set option", TokenKind::Eq)?;
        let value = Statement::Name(Name::bare(p.get_curr_literal()));
        p.next();
        options.push(Assignment {
            field: key,
            value: Box::new(value),
        });
        if p.is(TokenKind::Comma) {
            p.next();
        }
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_identifiers_lex_in_procedures() {
        let mut scan = crate::dialect::scanner_for("db2", "set option *sqlstate = x").unwrap();
        let mut literals = Vec::new();
        loop {
            let tok = scan.scan();
            if tok.kind == TokenKind::Eof {
                break;
            }
            literals.push((tok.kind, tok.literal));
        }
        assert_eq!(literals[0].1, "SET OPTION");
        assert_eq!(literals[1], (TokenKind::Ident, "*sqlstate".to_string()));
    }

    #[test]
    fn parse_db2_procedure() {
        let sql = "\
create or replace procedure audit_cleanup(in retention int)\n\
language sql\n\
deterministic\n\
modifies sql data\n\
called on null input\n\
begin\n\
  delete from audit_log where age > retention;\n\
end;";
        let mut parser = parser(sql);
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Statement::CreateProcedure(proc) => {
                assert!(proc.replace);
                assert_eq!(proc.name, "audit_cleanup");
                assert_eq!(proc.language.as_deref(), Some("sql"));
                assert_eq!(proc.deterministic, Some(true));
                assert_eq!(proc.data_access, Some(DataAccess::ModifiesSql));
                assert!(proc.null_input);
                assert_eq!(proc.body.len(), 1);
            }
            other => panic!("expected procedure, got {other:?}"),
        }
    }
}
