//! SQL dialect overlays.
//!
//! A dialect contributes a keyword set merged over the standard corpus plus
//! a handful of statement or lexing overrides. No overlay removes a
//! standard-SQL phrase; a dialect wanting that calls
//! [`crate::Parser::unregister_statement`] explicitly.

pub mod db2;
pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::{error, fmt};

use crate::keywords::{self, KeywordSet};
use crate::parser::Parser;
use crate::scanner::Scanner;

/// Names accepted for the standard grammar.
const STANDARD: &[&str] = &["", "ansi", "standard"];

/// An unrecognised dialect name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDialect(pub String);

impl fmt::Display for UnknownDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dialect: {}", self.0)
    }
}

impl error::Error for UnknownDialect {}

/// Build a parser for the named dialect.
pub fn parser_for(name: &str, source: impl Into<String>) -> Result<Parser, UnknownDialect> {
    match name {
        _ if STANDARD.contains(&name) => Ok(Parser::new(source)),
        "db2" => Ok(db2::parser(source)),
        "postgres" => Ok(postgres::parser(source)),
        "sqlite" => Ok(sqlite::parser(source)),
        "mssql" => Ok(mssql::parser(source)),
        "mysql" => Ok(mysql::parser(source)),
        other => Err(UnknownDialect(other.to_string())),
    }
}

/// The prepared keyword set for the named dialect.
pub fn keywords_for(name: &str) -> Result<KeywordSet, UnknownDialect> {
    let mut set = match name {
        _ if STANDARD.contains(&name) => keywords::standard(),
        "db2" => db2::keywords(),
        "postgres" => postgres::keywords(),
        "sqlite" => sqlite::keywords(),
        "mssql" => mssql::keywords(),
        "mysql" => mysql::keywords(),
        other => return Err(UnknownDialect(other.to_string())),
    };
    set.prepare();
    Ok(set)
}

/// A scanner configured for the named dialect, lexing hooks included.
pub fn scanner_for(name: &str, source: impl Into<String>) -> Result<Scanner, UnknownDialect> {
    let set = keywords_for(name)?;
    let mut scan = Scanner::new(source, std::sync::Arc::new(set));
    match name {
        "db2" => scan.register(std::rc::Rc::new(db2::StarIdent)),
        "mssql" => scan.register(std::rc::Rc::new(mssql::BracketIdent)),
        "mysql" => scan.register(std::rc::Rc::new(mysql::BacktickIdent)),
        _ => {}
    }
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dialect_resolves() {
        for name in ["ansi", "db2", "postgres", "sqlite", "mssql", "mysql"] {
            assert!(parser_for(name, "select 1;").is_ok(), "dialect {name}");
            assert!(keywords_for(name).is_ok(), "keywords {name}");
        }
        assert!(parser_for("oracle", "select 1;").is_err());
    }

    #[test]
    fn overlays_keep_the_standard_grammar() {
        for name in ["db2", "postgres", "sqlite", "mssql", "mysql"] {
            let mut parser = parser_for(name, "select a from t where a > 1;").expect("parser");
            let (stmts, errors) = parser.parse_all();
            assert!(errors.is_empty(), "{name}: {errors:?}");
            assert_eq!(stmts.len(), 1, "{name}");
        }
    }
}
