//! `#MACRO` line handling.
//!
//! Macros are dispatched before ordinary statement parsing. Each one
//! consumes its tokens up to and including the terminating `;`. `INCLUDE`
//! pushes a new input frame; `FORMAT` and `LINT` write into the parser's
//! configuration; `DEFINE`, `USE`, `VAR` and `ENV` are reserved and consumed
//! without effect.

use std::sync::Arc;

use squill_config::{Config, Value};

use crate::parser::{
    ParseError, Parser, IDENT_EXPECTED, MACRO_OPTION_UNKNOWN, MACRO_UNKNOWN, MAX_INCLUDE_DEPTH,
    MISSING_EOL, VALUE_EXPECTED,
};
use crate::parser::Frame;
use crate::scanner::Scanner;
use crate::token::TokenKind;

impl Parser {
    pub(crate) fn parse_macro(&mut self) -> Result<(), ParseError> {
        tracing::debug!(
            target: "squill.parse",
            macro_name = %self.get_curr_literal(),
            "macro dispatch"
        );
        match self.get_curr_literal().as_str() {
            "INCLUDE" => self.parse_include_macro(),
            "FORMAT" => self.parse_format_macro(),
            "LINT" => self.parse_lint_macro(),
            "DEFINE" | "USE" | "VAR" | "ENV" => self.parse_reserved_macro(),
            _ => Err(self.unexpected("macro", MACRO_UNKNOWN)),
        }
    }

    /// `#INCLUDE 'path';` — suspend the current stream and read tokens from
    /// the referenced file until its end.
    fn parse_include_macro(&mut self) -> Result<(), ParseError> {
        self.next();
        if !self.is(TokenKind::Literal) && !self.is(TokenKind::Ident) {
            return Err(self.unexpected("macro", VALUE_EXPECTED));
        }
        let file = self.frame.base.join(self.get_curr_literal());
        self.next();
        if !self.is(TokenKind::Eol) {
            return Err(self.unexpected("macro", MISSING_EOL));
        }
        // Open before consuming the terminator so a failed include recovers
        // at this macro line, leaving the rest of the stream intact.
        if self.stack.len() >= MAX_INCLUDE_DEPTH {
            return Err(self.unexpected("macro", "include files nested too deeply"));
        }
        let source = std::fs::read_to_string(&file).map_err(|err| {
            self.unexpected("macro", format!("unable to include {}: {err}", file.display()))
        })?;
        let base = file
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_else(|| self.frame.base.clone());
        self.next();
        let scan = Scanner::new(source, Arc::clone(&self.keywords));
        let frame = Frame::new(scan, base);
        let outer = std::mem::replace(&mut self.frame, frame);
        self.stack.push(outer);
        Ok(())
    }

    /// `#FORMAT key value;` — one formatter configuration entry.
    fn parse_format_macro(&mut self) -> Result<(), ParseError> {
        self.next();
        if !self.is(TokenKind::Ident) && !self.is(TokenKind::Literal) && !self.is(TokenKind::Keyword)
        {
            return Err(self.unexpected("format", IDENT_EXPECTED));
        }
        let key = self.get_curr_literal().to_lowercase();
        self.next();
        if !self.is(TokenKind::Ident)
            && !self.is(TokenKind::Number)
            && !self.is(TokenKind::Literal)
            && !self.is(TokenKind::Keyword)
        {
            return Err(self.unexpected("format", VALUE_EXPECTED));
        }
        let value = self.get_curr_literal().to_lowercase();
        match key.as_str() {
            "as" | "comma" | "quote" | "compact" | "space" | "keepspace" => {
                let parsed = parse_bool(&value)
                    .ok_or_else(|| self.unexpected("format", VALUE_EXPECTED))?;
                self.config.set(key, Value::Bool(parsed));
            }
            "comment" => {
                self.config.set(key, Value::Bool(value == "keep"));
            }
            "newline" => {
                self.config.set("crlf", Value::Bool(value == "crlf"));
            }
            "upperize" => self.config.add("upperize", value),
            "rewrite" => self.config.add("rewrite", value),
            "indent" => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| self.unexpected("format", VALUE_EXPECTED))?;
                self.config.set(key, Value::Int(parsed));
            }
            _ => return Err(self.unexpected("format", MACRO_OPTION_UNKNOWN)),
        }
        self.next();
        if !self.is(TokenKind::Eol) {
            return Err(self.unexpected("macro", MISSING_EOL));
        }
        self.next();
        Ok(())
    }

    /// `#LINT rule on|off;` or `#LINT rule <level> [priority];`.
    fn parse_lint_macro(&mut self) -> Result<(), ParseError> {
        self.next();
        if !self.is(TokenKind::Ident) && !self.is(TokenKind::Literal) && !self.is(TokenKind::Keyword)
        {
            return Err(self.unexpected("lint", IDENT_EXPECTED));
        }
        let rule = self.get_curr_literal().to_lowercase();
        self.next();

        if !self.is(TokenKind::Ident) && !self.is(TokenKind::Keyword) && !self.is(TokenKind::Number)
        {
            return Err(self.unexpected("lint", IDENT_EXPECTED));
        }
        let value = self.get_curr_literal().to_lowercase();
        if value == "on" || value == "off" {
            self.config.set(rule, Value::Bool(value == "on"));
            self.next();
            if !self.is(TokenKind::Eol) {
                return Err(self.unexpected("lint", MISSING_EOL));
            }
            self.next();
            return Ok(());
        }

        let mut sub = Config::new();
        if self.is(TokenKind::Ident) {
            sub.set("level", Value::Str(self.get_curr_literal()));
            self.next();
        }
        if self.is(TokenKind::Number) {
            let priority = self
                .get_curr_literal()
                .parse::<i64>()
                .map_err(|_| self.unexpected("lint", VALUE_EXPECTED))?;
            sub.set("priority", Value::Int(priority));
            self.next();
        }
        self.config.set(rule, Value::Map(sub));
        if !self.is(TokenKind::Eol) {
            return Err(self.unexpected("macro", MISSING_EOL));
        }
        self.next();
        Ok(())
    }

    /// `#DEFINE`, `#USE`, `#VAR`, `#ENV` — reserved; consumed to the EOL.
    fn parse_reserved_macro(&mut self) -> Result<(), ParseError> {
        while !self.done() && !self.is(TokenKind::Eol) {
            self.next();
        }
        if !self.is(TokenKind::Eol) {
            return Err(self.unexpected("macro", MISSING_EOL));
        }
        self.next();
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "t" | "on" | "yes" | "1" => Some(true),
        "false" | "f" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn format_macro_sets_config() {
        let mut parser = Parser::new("#FORMAT indent 4;\n#FORMAT quote true;\nselect 1;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(stmts.len(), 1);
        assert_eq!(parser.config.int("indent"), Some(4));
        assert_eq!(parser.config.bool("quote"), Some(true));
    }

    #[test]
    fn format_macro_accumulates_lists() {
        let mut parser =
            Parser::new("#FORMAT rewrite use-cte;\n#FORMAT rewrite std-expr;\nselect 1;");
        let (_, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            parser.config.list("rewrite"),
            Some(&["use-cte".to_string(), "std-expr".to_string()][..])
        );
    }

    #[test]
    fn format_macro_rejects_unknown_option() {
        let mut parser = Parser::new("#FORMAT sparkle on;\nselect 1;");
        let (stmts, errors) = parser.parse_all();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("macro option unknown"));
        // The remainder of the stream is still processed.
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn lint_macro_toggle_and_subconfig() {
        let mut parser =
            Parser::new("#LINT inconsistent_as off;\n#LINT expr_unqualified warning 2;\nselect 1;");
        let (_, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(parser.config.bool("inconsistent_as"), Some(false));
        match parser.config.get("expr_unqualified") {
            Some(Value::Map(sub)) => {
                assert_eq!(sub.str("level"), Some("warning"));
                assert_eq!(sub.int("priority"), Some(2));
            }
            other => panic!("expected sub-config, got {other:?}"),
        }
    }

    #[test]
    fn reserved_macros_are_consumed_without_effect() {
        let mut parser = Parser::new("#DEFINE q select 1;\n#ENV HOME;\nselect 2;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(stmts.len(), 1);
        assert!(parser.config.is_empty());
    }

    #[test]
    fn unknown_macro_is_an_error() {
        let mut parser = Parser::new("#FROBNICATE x;\nselect 1;");
        let (stmts, errors) = parser.parse_all();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("unknown macro"));
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn include_macro_splices_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inner = dir.path().join("inner.sql");
        std::fs::File::create(&inner)
            .and_then(|mut f| f.write_all(b"select 2;\n"))
            .expect("write inner");

        let mut parser = Parser::new("select 1;\n#INCLUDE 'inner.sql';\nselect 3;");
        parser.set_base_dir(dir.path());
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[1].to_string(), "SELECT 2");
    }

    #[test]
    fn include_macro_nests_to_depth_three() {
        let dir = tempfile::tempdir().expect("tempdir");
        let write = |name: &str, content: &str| {
            std::fs::File::create(dir.path().join(name))
                .and_then(|mut f| f.write_all(content.as_bytes()))
                .expect("write file");
        };
        write("a.sql", "select 10;\n#INCLUDE 'b.sql';\nselect 11;\n");
        write("b.sql", "select 20;\n#INCLUDE 'c.sql';\n");
        write("c.sql", "select 30;\n");

        let mut parser = Parser::new("#INCLUDE 'a.sql';\nselect 1;");
        parser.set_base_dir(dir.path());
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        let rendered: Vec<String> = stmts.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["SELECT 10", "SELECT 20", "SELECT 30", "SELECT 11", "SELECT 1"]
        );
    }

    #[test]
    fn include_of_missing_file_is_nonfatal() {
        let mut parser = Parser::new("#INCLUDE 'no-such-file.sql';\nselect 1;");
        let (stmts, errors) = parser.parse_all();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("unable to include"));
        assert_eq!(stmts.len(), 1);
    }
}
