//! Statement parse functions and the standard registration table.
//!
//! Every function here matches the [`StatementFn`] signature so dialects can
//! re-register or replace individual entries.

use squill_ast::{
    AlterTableAction, AlterTableStatement, Assignment, CallStatement, ColumnDef,
    CompoundStatement, Constraint, ConstraintKind, CreateProcedureStatement, CreateTableStatement,
    CreateViewStatement, CteStatement, DeclareStatement, DeleteStatement, DropStatement,
    GrantStatement, IfStatement, InsertStatement, Limit, Materialized, MergeAction, MergeOp,
    MergeStatement, Name, ParamMode, ProcedureParam, RevokeStatement, SelectStatement,
    SetStatement, Statement, TransactionStatement, TruncateStatement, UpdateStatement, Upsert,
    WhileStatement, WithStatement,
};

use crate::keywords::is_join;
use crate::parser::{
    keyword_expected, ParseError, Parser, DEFAULT_REASON, IDENT_EXPECTED, VALUE_EXPECTED,
};
use crate::token::TokenKind;

/// Install the standard-SQL statement table. Dialects build on top of this.
pub(crate) fn register_standard(p: &mut Parser) {
    p.register_statement("SELECT", Parser::parse_select);
    p.register_statement("VALUES", Parser::parse_values);
    p.register_statement("DELETE FROM", Parser::parse_delete);
    p.register_statement("UPDATE", Parser::parse_update);
    p.register_statement("INSERT INTO", Parser::parse_insert);
    p.register_statement("MERGE", Parser::parse_merge);
    p.register_statement("MERGE INTO", Parser::parse_merge);
    p.register_statement("TRUNCATE", Parser::parse_truncate);
    p.register_statement("TRUNCATE TABLE", Parser::parse_truncate);
    p.register_statement("WITH", Parser::parse_with);
    p.register_statement("CASE", Parser::parse_case);
    p.register_statement("IF", Parser::parse_if);
    p.register_statement("WHILE", Parser::parse_while);
    p.register_statement("DECLARE", Parser::parse_declare);
    p.register_statement("SET", Parser::parse_set);
    p.register_statement("RETURN", Parser::parse_return);
    p.register_statement("BEGIN", Parser::parse_begin);
    p.register_statement("CALL", Parser::parse_call);
    p.register_statement("START TRANSACTION", Parser::parse_start_transaction);
    p.register_statement("SET TRANSACTION", Parser::parse_set_transaction);
    p.register_statement("SAVEPOINT", Parser::parse_savepoint);
    p.register_statement("RELEASE", Parser::parse_release);
    p.register_statement("RELEASE SAVEPOINT", Parser::parse_release);
    p.register_statement("ROLLBACK TO SAVEPOINT", Parser::parse_rollback_to_savepoint);
    p.register_statement("COMMIT", Parser::parse_commit);
    p.register_statement("ROLLBACK", Parser::parse_rollback);
    p.register_statement("CREATE TABLE", Parser::parse_create_table);
    p.register_statement("CREATE TEMP TABLE", Parser::parse_create_table);
    p.register_statement("CREATE TEMPORARY TABLE", Parser::parse_create_table);
    p.register_statement("CREATE VIEW", Parser::parse_create_view);
    p.register_statement("CREATE TEMP VIEW", Parser::parse_create_view);
    p.register_statement("CREATE TEMPORARY VIEW", Parser::parse_create_view);
    p.register_statement("CREATE PROCEDURE", Parser::parse_create_procedure);
    p.register_statement("CREATE OR REPLACE PROCEDURE", Parser::parse_create_procedure);
    p.register_statement("ALTER TABLE", Parser::parse_alter_table);
    p.register_statement("DROP TABLE", Parser::parse_drop_table);
    p.register_statement("DROP VIEW", Parser::parse_drop_view);
    p.register_statement("GRANT", Parser::parse_grant);
    p.register_statement("REVOKE", Parser::parse_revoke);
}

impl Parser {
    // -- queries ------------------------------------------------------------

    pub fn parse_select(&mut self) -> Result<Statement, ParseError> {
        self.next();
        self.parse_select_tail()
    }

    /// The body of a `SELECT` after the opening keyword; dialects that put
    /// syntax between `SELECT` and the projection re-enter here.
    pub fn parse_select_tail(&mut self) -> Result<Statement, ParseError> {
        let stmt = self.parse_select_body()?;
        self.parse_compound(Statement::Select(stmt))
    }

    /// One `SELECT` body without the compound continuation, so dialects can
    /// adjust the bare select before `UNION`/`INTERSECT`/`EXCEPT` wrap it.
    pub fn parse_select_body(&mut self) -> Result<SelectStatement, ParseError> {
        let mut stmt = SelectStatement::default();

        loop {
            if self.query_ends() || self.is_keyword("FROM") {
                break;
            }
            let column = self.start_expression()?;
            stmt.columns.push(column);
            if self.is(TokenKind::Comma) {
                self.next();
                if self.is_keyword("FROM") || self.query_ends() {
                    return Err(self.unexpected("select", "unexpected keyword after comma"));
                }
            } else {
                break;
            }
        }
        if stmt.columns.is_empty() {
            return Err(self.unexpected("select", VALUE_EXPECTED));
        }

        if self.is_keyword("FROM") {
            self.next();
            stmt.tables = self.parse_from()?;
        }
        if self.is_keyword("WHERE") {
            self.next();
            stmt.where_clause = Some(Box::new(self.start_expression()?));
        }
        if self.is_keyword("GROUP BY") {
            self.next();
            stmt.groups = self.parse_expression_list()?;
        }
        if self.is_keyword("HAVING") {
            self.next();
            stmt.having = Some(Box::new(self.start_expression()?));
        }
        if self.is_keyword("WINDOW") {
            self.next();
            stmt.windows = self.parse_named_windows()?;
        }
        if self.is_keyword("ORDER BY") {
            self.next();
            stmt.orders = self.parse_order_terms()?;
        }
        stmt.limit = self.parse_limit()?;
        Ok(stmt)
    }

    /// `UNION` / `INTERSECT` / `EXCEPT` continuation after a query body.
    pub fn parse_compound(&mut self, left: Statement) -> Result<Statement, ParseError> {
        let kw = self.get_curr_literal();
        if !self.is(TokenKind::Keyword)
            || !matches!(kw.as_str(), "UNION" | "INTERSECT" | "EXCEPT")
        {
            return Ok(left);
        }
        self.next();
        let mut all = false;
        let mut distinct = false;
        if self.is_keyword("ALL") {
            all = true;
            self.next();
        } else if self.is_keyword("DISTINCT") {
            distinct = true;
            self.next();
        }
        let right = self.parse_statement()?;
        let compound = CompoundStatement {
            left: Box::new(left),
            right: Box::new(right),
            all,
            distinct,
        };
        Ok(match kw.as_str() {
            "UNION" => Statement::Union(compound),
            "INTERSECT" => Statement::Intersect(compound),
            _ => Statement::Except(compound),
        })
    }

    fn parse_from(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut tables = Vec::new();
        loop {
            let table = if self.is(TokenKind::Lparen) {
                self.parse_group_expr()?
            } else {
                self.parse_ident()?
            };
            tables.push(table);
            while self.is(TokenKind::Keyword) && is_join(&self.get_curr_literal()) {
                tables.push(self.parse_join()?);
            }
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(tables)
    }

    fn parse_join(&mut self) -> Result<Statement, ParseError> {
        let join_type = self.get_curr_literal();
        self.next();
        let table = if self.is(TokenKind::Lparen) {
            self.parse_group_expr()?
        } else {
            self.parse_ident()?
        };
        let mut cond = None;
        if self.is_keyword("ON") {
            self.next();
            cond = Some(Box::new(self.start_expression()?));
        } else if self.is_keyword("USING") {
            self.next();
            self.expect("join", TokenKind::Lparen)?;
            let mut columns = Vec::new();
            while !self.done() && !self.is(TokenKind::Rparen) {
                columns.push(self.parse_identifier()?);
                self.ensure_end("join", TokenKind::Comma, TokenKind::Rparen)?;
            }
            self.expect("join", TokenKind::Rparen)?;
            cond = Some(Box::new(Statement::List(columns)));
        }
        Ok(Statement::Join(squill_ast::Join {
            join_type,
            table: Box::new(table),
            cond,
        }))
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut list = Vec::new();
        loop {
            list.push(self.start_expression()?);
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(list)
    }

    fn parse_order_terms(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut list = Vec::new();
        loop {
            list.push(self.parse_order_term()?);
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(list)
    }

    fn parse_named_windows(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut list = Vec::new();
        loop {
            if !self.is(TokenKind::Ident) {
                return Err(self.unexpected("window", IDENT_EXPECTED));
            }
            let ident = self.get_curr_literal();
            self.next();
            if !self.is_keyword("AS") {
                return Err(self.unexpected("window", keyword_expected("AS")));
            }
            self.next();
            let mut def = self.parse_window_spec()?;
            def.ident = Some(ident);
            list.push(Statement::WindowDef(def));
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(list)
    }

    fn parse_limit(&mut self) -> Result<Option<Limit>, ParseError> {
        let mut limit = Limit::default();
        let mut present = false;
        if self.is_keyword("LIMIT") {
            self.next();
            limit.count = Some(self.parse_count("limit")?);
            present = true;
        }
        if self.is_keyword("OFFSET") {
            self.next();
            limit.offset = Some(self.parse_count("offset")?);
            if self.is_keyword("ROW") || self.is_keyword("ROWS") {
                self.next();
            }
            present = true;
        }
        if self.is_keyword("FETCH") {
            self.next();
            if self.is_keyword("FIRST") || self.is_keyword("NEXT") {
                self.next();
            }
            limit.count = Some(self.parse_count("fetch")?);
            if !self.is_keyword("ROW") && !self.is_keyword("ROWS") {
                return Err(self.unexpected("fetch", keyword_expected("ROWS")));
            }
            self.next();
            if !self.is_keyword("ONLY") {
                return Err(self.unexpected("fetch", keyword_expected("ONLY")));
            }
            self.next();
            present = true;
        }
        Ok(present.then_some(limit))
    }

    fn parse_count(&mut self, ctx: &str) -> Result<i64, ParseError> {
        if !self.is(TokenKind::Number) {
            return Err(self.unexpected(ctx, VALUE_EXPECTED));
        }
        let count = self
            .get_curr_literal()
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| self.unexpected(ctx, VALUE_EXPECTED))?;
        self.next();
        Ok(count)
    }

    pub fn parse_values(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let mut rows = Vec::new();
        loop {
            self.expect("values", TokenKind::Lparen)?;
            let mut row = Vec::new();
            while !self.done() && !self.is(TokenKind::Rparen) {
                let value = self.start_expression()?;
                self.ensure_end("values", TokenKind::Comma, TokenKind::Rparen)?;
                row.push(value);
            }
            self.expect("values", TokenKind::Rparen)?;
            rows.push(Statement::List(row));
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(Statement::Values(rows))
    }

    pub fn parse_with(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let mut recursive = false;
        if self.is_keyword("RECURSIVE") {
            recursive = true;
            self.next();
        }
        let mut queries = Vec::new();
        while !self.done() && !self.is(TokenKind::Keyword) {
            let cte = self.parse_cte()?;
            queries.push(cte);
            self.ensure_end_kw("with", TokenKind::Comma)?;
        }
        let body = self.parse_statement()?;
        Ok(Statement::With(WithStatement {
            recursive,
            queries,
            body: Box::new(body),
        }))
    }

    fn parse_cte(&mut self) -> Result<Statement, ParseError> {
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("subquery", IDENT_EXPECTED));
        }
        let ident = self.get_curr_literal();
        self.next();
        let columns = self.parse_columns_list()?;
        if !self.is_keyword("AS") {
            return Err(self.unexpected("subquery", keyword_expected("AS")));
        }
        self.next();
        let mut materialized = Materialized::Unspecified;
        if self.is_keyword("MATERIALIZED") {
            materialized = Materialized::Materialized;
            self.next();
        } else if self.is_keyword("NOT") {
            self.next();
            if !self.is_keyword("MATERIALIZED") {
                return Err(self.unexpected("subquery", keyword_expected("MATERIALIZED")));
            }
            materialized = Materialized::NotMaterialized;
            self.next();
        }
        self.expect("subquery", TokenKind::Lparen)?;
        let body = self.parse_statement()?;
        self.expect("subquery", TokenKind::Rparen)?;
        Ok(Statement::Cte(CteStatement {
            ident,
            columns,
            materialized,
            body: Box::new(body),
        }))
    }

    /// A parenthesised list of bare column names; absent parens mean an
    /// empty list.
    pub fn parse_columns_list(&mut self) -> Result<Vec<String>, ParseError> {
        if !self.is(TokenKind::Lparen) {
            return Ok(Vec::new());
        }
        self.next();
        let mut list = Vec::new();
        while !self.done() && !self.is(TokenKind::Rparen) {
            if !self.curr().is_value() {
                return Err(self.unexpected("columns", IDENT_EXPECTED));
            }
            list.push(self.get_curr_literal());
            self.next();
            self.ensure_end("columns", TokenKind::Comma, TokenKind::Rparen)?;
        }
        self.expect("columns", TokenKind::Rparen)?;
        Ok(list)
    }

    // -- mutations ----------------------------------------------------------

    pub fn parse_delete(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let table = self.parse_ident()?;
        let mut stmt = DeleteStatement {
            table: Box::new(table),
            where_clause: None,
            returning: None,
        };
        if self.is_keyword("WHERE") {
            self.next();
            stmt.where_clause = Some(Box::new(self.start_expression()?));
        }
        stmt.returning = self.parse_returning()?;
        Ok(Statement::Delete(stmt))
    }

    pub fn parse_update(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let table = self.parse_ident()?;
        if !self.is_keyword("SET") {
            return Err(self.unexpected("update", keyword_expected("SET")));
        }
        self.next();
        let mut stmt = UpdateStatement {
            table: Box::new(table),
            set: Vec::new(),
            tables: Vec::new(),
            where_clause: None,
            returning: None,
        };
        loop {
            stmt.set.push(self.parse_assignment()?);
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        if self.is_keyword("FROM") {
            self.next();
            stmt.tables = self.parse_from()?;
        }
        if self.is_keyword("WHERE") {
            self.next();
            stmt.where_clause = Some(Box::new(self.start_expression()?));
        }
        stmt.returning = self.parse_returning()?;
        Ok(Statement::Update(stmt))
    }

    pub(crate) fn parse_assignment(&mut self) -> Result<Assignment, ParseError> {
        let field = if self.is(TokenKind::Lparen) {
            self.next();
            let mut names = Vec::new();
            while !self.done() && !self.is(TokenKind::Rparen) {
                names.push(self.parse_identifier()?);
                self.ensure_end("update", TokenKind::Comma, TokenKind::Rparen)?;
            }
            self.expect("update", TokenKind::Rparen)?;
            Statement::List(names)
        } else {
            self.parse_identifier()?
        };
        self.expect("update", TokenKind::Eq)?;
        let value = if self.is(TokenKind::Lparen) && !self.peek_is_keyword("SELECT") {
            // Tuple assignment: (a, b) = (1, 2).
            self.next();
            let mut values = Vec::new();
            while !self.done() && !self.is(TokenKind::Rparen) {
                values.push(self.start_expression()?);
                self.ensure_end("update", TokenKind::Comma, TokenKind::Rparen)?;
            }
            self.expect("update", TokenKind::Rparen)?;
            Statement::List(values)
        } else {
            self.start_expression()?
        };
        Ok(Assignment {
            field,
            value: Box::new(value),
        })
    }

    fn parse_returning(&mut self) -> Result<Option<Box<Statement>>, ParseError> {
        if !self.is_keyword("RETURNING") {
            return Ok(None);
        }
        self.next();
        if self.is(TokenKind::Star) {
            self.next();
            return Ok(Some(Box::new(Statement::Value(squill_ast::Value::new(
                "*",
            )))));
        }
        let mut list = Vec::new();
        while !self.done() && !self.query_ends() {
            list.push(self.start_expression()?);
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(Some(Box::new(Statement::List(list))))
    }

    pub fn parse_insert(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let table = self.parse_identifier()?;
        let columns = self.parse_columns_list()?;
        let source = if self.is_keyword("VALUES")
            || self.is_keyword("SELECT")
            || self.is_keyword("WITH")
        {
            self.parse_statement()?
        } else {
            return Err(self.unexpected("insert", keyword_expected("VALUES")));
        };
        let mut stmt = InsertStatement {
            table: Box::new(table),
            columns,
            source: Box::new(source),
            upsert: None,
            returning: None,
        };
        stmt.upsert = self.parse_upsert()?;
        stmt.returning = self.parse_returning()?;
        Ok(Statement::Insert(stmt))
    }

    fn parse_upsert(&mut self) -> Result<Option<Upsert>, ParseError> {
        if !self.is_keyword("ON CONFLICT") {
            return Ok(None);
        }
        self.next();
        let mut upsert = Upsert {
            columns: self.parse_columns_list()?,
            ..Upsert::default()
        };
        if !self.is_keyword("DO") {
            return Err(self.unexpected("upsert", keyword_expected("DO")));
        }
        self.next();
        if self.is_keyword("NOTHING") {
            self.next();
            return Ok(Some(upsert));
        }
        if !self.is_keyword("UPDATE") {
            return Err(self.unexpected("upsert", keyword_expected("UPDATE")));
        }
        self.next();
        if !self.is_keyword("SET") {
            return Err(self.unexpected("upsert", keyword_expected("SET")));
        }
        self.next();
        let mut assignments = Vec::new();
        loop {
            assignments.push(self.parse_assignment()?);
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        upsert.action = Some(assignments);
        if self.is_keyword("WHERE") {
            self.next();
            upsert.where_clause = Some(Box::new(self.start_expression()?));
        }
        Ok(Some(upsert))
    }

    pub fn parse_merge(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let target = self.parse_ident()?;
        if !self.is_keyword("USING") {
            return Err(self.unexpected("merge", keyword_expected("USING")));
        }
        self.next();
        let source = if self.is(TokenKind::Lparen) {
            self.parse_group_expr()?
        } else {
            self.parse_ident()?
        };
        if !self.is_keyword("ON") {
            return Err(self.unexpected("merge", keyword_expected("ON")));
        }
        self.next();
        let on = self.start_expression()?;
        let mut stmt = MergeStatement {
            target: Box::new(target),
            source: Box::new(source),
            on: Box::new(on),
            actions: Vec::new(),
        };
        while self.is_keyword("WHEN MATCHED") || self.is_keyword("WHEN NOT MATCHED") {
            stmt.actions.push(self.parse_merge_action()?);
        }
        if stmt.actions.is_empty() {
            return Err(self.unexpected("merge", keyword_expected("WHEN MATCHED")));
        }
        Ok(Statement::Merge(stmt))
    }

    fn parse_merge_action(&mut self) -> Result<MergeAction, ParseError> {
        let matched = self.is_keyword("WHEN MATCHED");
        self.next();
        let mut cdt = None;
        if self.is_keyword("AND") {
            self.next();
            cdt = Some(Box::new(self.start_expression()?));
        }
        if !self.is_keyword("THEN") {
            return Err(self.unexpected("merge", keyword_expected("THEN")));
        }
        self.next();
        let action = if self.is_keyword("UPDATE") {
            self.next();
            if !self.is_keyword("SET") {
                return Err(self.unexpected("merge", keyword_expected("SET")));
            }
            self.next();
            let mut assignments = Vec::new();
            loop {
                assignments.push(self.parse_assignment()?);
                if self.is(TokenKind::Comma) {
                    self.next();
                } else {
                    break;
                }
            }
            MergeOp::Update(assignments)
        } else if self.is_keyword("DELETE") {
            self.next();
            MergeOp::Delete
        } else if self.is_keyword("INSERT") {
            self.next();
            let columns = self.parse_columns_list()?;
            if !self.is_keyword("VALUES") {
                return Err(self.unexpected("merge", keyword_expected("VALUES")));
            }
            self.next();
            self.expect("merge", TokenKind::Lparen)?;
            let mut values = Vec::new();
            while !self.done() && !self.is(TokenKind::Rparen) {
                let value = self.start_expression()?;
                self.ensure_end("merge", TokenKind::Comma, TokenKind::Rparen)?;
                values.push(value);
            }
            self.expect("merge", TokenKind::Rparen)?;
            MergeOp::Insert { columns, values }
        } else if self.is_keyword("DO") {
            self.next();
            if !self.is_keyword("NOTHING") {
                return Err(self.unexpected("merge", keyword_expected("NOTHING")));
            }
            self.next();
            MergeOp::DoNothing
        } else {
            return Err(self.unexpected("merge", DEFAULT_REASON));
        };
        Ok(MergeAction {
            matched,
            cdt,
            action,
        })
    }

    pub fn parse_truncate(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let mut stmt = TruncateStatement::default();
        if self.is_keyword("ONLY") {
            stmt.only = true;
            self.next();
        }
        loop {
            stmt.tables.push(self.parse_ident()?);
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        if self.is_keyword("RESTART IDENTITY") {
            stmt.identity = Some("restart".into());
            self.next();
        } else if self.is_keyword("CONTINUE IDENTITY") {
            stmt.identity = Some("continue".into());
            self.next();
        }
        if self.is_keyword("CASCADE") {
            stmt.cascade = true;
            self.next();
        } else if self.is_keyword("RESTRICT") {
            stmt.restrict = true;
            self.next();
        }
        Ok(Statement::Truncate(stmt))
    }

    // -- DDL ----------------------------------------------------------------

    pub fn parse_create_table(&mut self) -> Result<Statement, ParseError> {
        let temp = self.get_curr_literal().contains("TEMP");
        self.next();
        let mut not_exists = false;
        if self.is_keyword("IF NOT EXISTS") {
            not_exists = true;
            self.next();
        }
        let name = self.parse_identifier()?;
        self.expect("create table", TokenKind::Lparen)?;
        let mut columns = Vec::new();
        while !self.done() && !self.is(TokenKind::Rparen) && !self.is(TokenKind::Keyword) {
            columns.push(self.parse_column_def()?);
            self.ensure_end("create table", TokenKind::Comma, TokenKind::Rparen)?;
        }
        let mut constraints = Vec::new();
        while !self.done() && !self.is(TokenKind::Rparen) {
            constraints.push(self.parse_constraint(false)?);
            self.ensure_end("create table", TokenKind::Comma, TokenKind::Rparen)?;
        }
        self.expect("create table", TokenKind::Rparen)?;
        Ok(Statement::CreateTable(CreateTableStatement {
            temp,
            not_exists,
            name: Box::new(name),
            columns,
            constraints,
        }))
    }

    /// One column definition: name, type, inline constraints.
    pub fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("column", IDENT_EXPECTED));
        }
        let mut def = ColumnDef {
            name: self.get_curr_literal(),
            ty: squill_ast::Type::default(),
            constraints: Vec::new(),
        };
        self.next();
        def.ty = self.parse_type()?;
        while !self.done()
            && !self.is(TokenKind::Comma)
            && !self.is(TokenKind::Rparen)
            && !self.is(TokenKind::Eol)
        {
            def.constraints.push(self.parse_constraint(true)?);
        }
        Ok(def)
    }

    /// A table or column constraint; `column` selects the short forms.
    pub fn parse_constraint(&mut self, column: bool) -> Result<Constraint, ParseError> {
        let mut name = None;
        if self.is_keyword("CONSTRAINT") {
            self.next();
            name = Some(self.get_curr_literal());
            self.next();
        }
        let kind = self.parse_constraint_kind(column)?;
        Ok(Constraint { name, kind })
    }

    fn parse_constraint_kind(&mut self, column: bool) -> Result<ConstraintKind, ParseError> {
        if self.is_keyword("PRIMARY KEY") {
            self.next();
            if column {
                return Ok(ConstraintKind::PrimaryKey {
                    columns: Vec::new(),
                });
            }
            let columns = self.parse_ident_parens("primary key")?;
            return Ok(ConstraintKind::PrimaryKey { columns });
        }
        if self.is_keyword("FOREIGN KEY") || self.is_keyword("REFERENCES") {
            let mut locals = Vec::new();
            if self.is_keyword("FOREIGN KEY") {
                self.next();
                locals = self.parse_ident_parens("foreign key")?;
            }
            if !self.is_keyword("REFERENCES") {
                return Err(self.unexpected("foreign key", keyword_expected("REFERENCES")));
            }
            self.next();
            if !self.is(TokenKind::Ident) {
                return Err(self.unexpected("foreign key", IDENT_EXPECTED));
            }
            let table = self.get_curr_literal();
            self.next();
            let remotes = self.parse_ident_parens("foreign key")?;
            return Ok(ConstraintKind::ForeignKey {
                locals,
                table,
                remotes,
            });
        }
        if self.is_keyword("UNIQUE") {
            self.next();
            if column {
                return Ok(ConstraintKind::Unique {
                    columns: Vec::new(),
                });
            }
            let columns = self.parse_ident_parens("unique")?;
            return Ok(ConstraintKind::Unique { columns });
        }
        if self.is_keyword("NOT") {
            if !column {
                return Err(self.unexpected("constraint", DEFAULT_REASON));
            }
            self.next();
            if !self.is_keyword("NULL") {
                return Err(self.unexpected("constraint", keyword_expected("NULL")));
            }
            self.next();
            return Ok(ConstraintKind::NotNull);
        }
        if self.is_keyword("CHECK") {
            self.next();
            let expr = self.start_expression()?;
            return Ok(ConstraintKind::Check {
                expr: Box::new(expr),
            });
        }
        if self.is_keyword("DEFAULT") {
            if !column {
                return Err(self.unexpected("constraint", DEFAULT_REASON));
            }
            self.next();
            let expr = self.start_expression()?;
            return Ok(ConstraintKind::Default {
                expr: Box::new(expr),
            });
        }
        if self.is_keyword("GENERATED ALWAYS") || self.is_keyword("AS") {
            if self.is_keyword("GENERATED ALWAYS") {
                self.next();
                if !self.is_keyword("AS") {
                    return Err(self.unexpected("generated always", keyword_expected("AS")));
                }
            }
            self.next();
            let expr = self.start_expression()?;
            if !self.is_keyword("STORED") {
                return Err(self.unexpected("generated always", keyword_expected("STORED")));
            }
            self.next();
            return Ok(ConstraintKind::Generated {
                expr: Box::new(expr),
            });
        }
        Err(self.unexpected("constraint", DEFAULT_REASON))
    }

    fn parse_ident_parens(&mut self, ctx: &str) -> Result<Vec<String>, ParseError> {
        self.expect(ctx, TokenKind::Lparen)?;
        let mut list = Vec::new();
        while !self.done() && !self.is(TokenKind::Rparen) {
            if !self.is(TokenKind::Ident) {
                return Err(self.unexpected(ctx, IDENT_EXPECTED));
            }
            list.push(self.get_curr_literal());
            self.next();
            self.ensure_end(ctx, TokenKind::Comma, TokenKind::Rparen)?;
        }
        self.expect(ctx, TokenKind::Rparen)?;
        Ok(list)
    }

    pub fn parse_alter_table(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let name = self.parse_identifier()?;
        let action = if self.is_keyword("RENAME TO") {
            self.next();
            let name = self.get_curr_literal();
            self.next();
            AlterTableAction::RenameTable { name }
        } else if self.is_keyword("RENAME COLUMN") || self.is_keyword("RENAME CONSTRAINT") {
            let constraint = self.is_keyword("RENAME CONSTRAINT");
            self.next();
            let src = self.get_curr_literal();
            self.next();
            if !self.is_keyword("TO") {
                return Err(self.unexpected("alter table", keyword_expected("TO")));
            }
            self.next();
            let dst = self.get_curr_literal();
            self.next();
            if constraint {
                AlterTableAction::RenameConstraint { src, dst }
            } else {
                AlterTableAction::RenameColumn { src, dst }
            }
        } else if self.is_keyword("ADD") || self.is_keyword("ADD COLUMN") {
            self.next();
            let not_exists = self.is_keyword("IF NOT EXISTS");
            if not_exists {
                self.next();
            }
            let def = self.parse_column_def()?;
            AlterTableAction::AddColumn { def, not_exists }
        } else if self.is_keyword("ADD CONSTRAINT") {
            self.next();
            let cname = self.get_curr_literal();
            self.next();
            let kind = self.parse_constraint_kind(false)?;
            AlterTableAction::AddConstraint {
                constraint: Constraint {
                    name: Some(cname),
                    kind,
                },
            }
        } else if self.is_keyword("DROP") || self.is_keyword("DROP COLUMN") {
            self.next();
            let exists = self.is_keyword("IF EXISTS");
            if exists {
                self.next();
            }
            let name = self.get_curr_literal();
            self.next();
            AlterTableAction::DropColumn { name, exists }
        } else if self.is_keyword("DROP CONSTRAINT") {
            self.next();
            let exists = self.is_keyword("IF EXISTS");
            if exists {
                self.next();
            }
            let name = self.get_curr_literal();
            self.next();
            AlterTableAction::DropConstraint { name, exists }
        } else {
            return Err(self.unexpected("alter table", DEFAULT_REASON));
        };
        Ok(Statement::AlterTable(AlterTableStatement {
            name: Box::new(name),
            action,
        }))
    }

    pub fn parse_drop_table(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let exists = self.is_keyword("IF EXISTS");
        if exists {
            self.next();
        }
        let name = self.parse_identifier()?;
        Ok(Statement::DropTable(DropStatement {
            name: Box::new(name),
            exists,
        }))
    }

    pub fn parse_drop_view(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let exists = self.is_keyword("IF EXISTS");
        if exists {
            self.next();
        }
        let name = self.parse_identifier()?;
        Ok(Statement::DropView(DropStatement {
            name: Box::new(name),
            exists,
        }))
    }

    pub fn parse_create_view(&mut self) -> Result<Statement, ParseError> {
        let temp = self.get_curr_literal().contains("TEMP");
        self.next();
        let name = self.parse_identifier()?;
        let columns = self.parse_columns_list()?;
        if !self.is_keyword("AS") {
            return Err(self.unexpected("create view", keyword_expected("AS")));
        }
        self.next();
        let body = self.parse_statement()?;
        Ok(Statement::CreateView(CreateViewStatement {
            temp,
            name: Box::new(name),
            columns,
            body: Box::new(body),
        }))
    }

    pub fn parse_create_procedure(&mut self) -> Result<Statement, ParseError> {
        let replace = self.get_curr_literal().contains("OR REPLACE");
        self.next();
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("procedure", IDENT_EXPECTED));
        }
        let mut stmt = CreateProcedureStatement {
            replace,
            name: self.get_curr_literal(),
            parameters: Vec::new(),
            language: None,
            deterministic: None,
            data_access: None,
            null_input: false,
            options: Vec::new(),
            body: Vec::new(),
        };
        self.next();
        stmt.parameters = self.parse_procedure_parameters()?;
        if self.is_keyword("LANGUAGE") {
            self.next();
            stmt.language = Some(self.get_curr_literal());
            self.next();
        }
        if !self.is_keyword("BEGIN") {
            return Err(self.unexpected("procedure", keyword_expected("BEGIN")));
        }
        self.next();
        stmt.body = self.parse_body_until(&["END"])?;
        self.next();
        Ok(Statement::CreateProcedure(stmt))
    }

    /// The parenthesised parameter list of a procedure definition.
    pub fn parse_procedure_parameters(&mut self) -> Result<Vec<ProcedureParam>, ParseError> {
        self.expect("procedure", TokenKind::Lparen)?;
        let mut params = Vec::new();
        while !self.done() && !self.is(TokenKind::Rparen) {
            let mode = if self.is_keyword("IN") {
                self.next();
                ParamMode::In
            } else if self.is_keyword("OUT") {
                self.next();
                ParamMode::Out
            } else if self.is_keyword("INOUT") {
                self.next();
                ParamMode::InOut
            } else {
                ParamMode::In
            };
            if !self.is(TokenKind::Ident) {
                return Err(self.unexpected("procedure", IDENT_EXPECTED));
            }
            let name = self.get_curr_literal();
            self.next();
            let ty = self.parse_type()?;
            let mut default = None;
            if self.is_keyword("DEFAULT") {
                self.next();
                default = Some(Box::new(self.start_expression()?));
            }
            self.ensure_end("procedure", TokenKind::Comma, TokenKind::Rparen)?;
            params.push(ProcedureParam {
                mode,
                name,
                ty,
                default,
            });
        }
        self.expect("procedure", TokenKind::Rparen)?;
        Ok(params)
    }

    /// Statements (each `;`-terminated) until one of the stop keywords.
    pub fn parse_body_until(&mut self, stops: &[&str]) -> Result<Vec<Statement>, ParseError> {
        let mut body = Vec::new();
        loop {
            if self.done() {
                return Err(self.unexpected("body", keyword_expected(stops[0])));
            }
            if self.is(TokenKind::Keyword) && stops.contains(&self.get_curr_literal().as_str()) {
                break;
            }
            let stmt = self.parse_statement()?;
            self.expect("body", TokenKind::Eol)?;
            body.push(stmt);
        }
        Ok(body)
    }

    // -- procedural ---------------------------------------------------------

    pub fn parse_begin(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let body = self.parse_body_until(&["END"])?;
        self.next();
        Ok(Statement::Begin(body))
    }

    pub fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let stmt = self.parse_if_tail()?;
        if !self.is_keyword("END IF") {
            return Err(self.unexpected("if", keyword_expected("END IF")));
        }
        self.next();
        Ok(Statement::If(stmt))
    }

    fn parse_if_tail(&mut self) -> Result<IfStatement, ParseError> {
        let cdt = self.start_expression()?;
        if !self.is_keyword("THEN") {
            return Err(self.unexpected("if", keyword_expected("THEN")));
        }
        self.next();
        let csq = self.parse_body_until(&["ELSE", "ELSIF", "END IF"])?;
        let alt = if self.is_keyword("ELSIF") {
            self.next();
            vec![Statement::If(self.parse_if_tail()?)]
        } else if self.is_keyword("ELSE") {
            self.next();
            self.parse_body_until(&["END IF"])?
        } else {
            Vec::new()
        };
        Ok(IfStatement {
            cdt: Box::new(cdt),
            csq,
            alt,
        })
    }

    pub fn parse_while(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let cdt = self.start_expression()?;
        if !self.is_keyword("DO") {
            return Err(self.unexpected("while", keyword_expected("DO")));
        }
        self.next();
        let body = self.parse_body_until(&["END WHILE"])?;
        self.next();
        Ok(Statement::While(WhileStatement {
            cdt: Box::new(cdt),
            body,
        }))
    }

    pub fn parse_declare(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("declare", IDENT_EXPECTED));
        }
        let ident = self.get_curr_literal();
        self.next();
        let ty = self.parse_type()?;
        let mut value = None;
        if self.is_keyword("DEFAULT") {
            self.next();
            value = Some(Box::new(self.start_expression()?));
        }
        Ok(Statement::Declare(DeclareStatement { ident, ty, value }))
    }

    pub fn parse_set(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let ident = match self.parse_identifier()? {
            Statement::Name(name) => name,
            _ => Name::default(),
        };
        self.expect("set", TokenKind::Eq)?;
        let value = self.start_expression()?;
        Ok(Statement::Set(SetStatement {
            ident,
            value: Box::new(value),
        }))
    }

    pub fn parse_return(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if self.query_ends() {
            return Ok(Statement::Return(None));
        }
        let value = self.start_expression()?;
        Ok(Statement::Return(Some(Box::new(value))))
    }

    pub fn parse_call(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let ident = self.parse_identifier()?;
        let mut stmt = CallStatement {
            ident: Box::new(ident),
            names: Vec::new(),
            args: Vec::new(),
        };
        if !self.is(TokenKind::Lparen) {
            return Err(self.unexpected("call", crate::parser::MISSING_OPEN_PAREN));
        }
        self.next();
        while !self.done() && !self.is(TokenKind::Rparen) {
            if self.is(TokenKind::Ident) && self.peek_is(TokenKind::Arrow) {
                stmt.names.push(self.get_curr_literal());
                self.next();
                self.next();
            }
            let arg = self.start_expression()?;
            self.ensure_end("call", TokenKind::Comma, TokenKind::Rparen)?;
            stmt.args.push(arg);
        }
        self.expect("call", TokenKind::Rparen)?;
        Ok(Statement::Call(stmt))
    }

    // -- transactions -------------------------------------------------------

    fn parse_transaction_modes(&mut self) -> Result<Vec<String>, ParseError> {
        let mut modes = Vec::new();
        loop {
            if self.is_keyword("READ WRITE") || self.is_keyword("READ ONLY") {
                modes.push(self.get_curr_literal());
                self.next();
            } else if self.is_keyword("ISOLATION LEVEL") {
                self.next();
                if !(self.is_keyword("REPEATABLE READ")
                    || self.is_keyword("READ COMMITTED")
                    || self.is_keyword("READ UNCOMMITTED")
                    || self.is_keyword("SERIALIZABLE"))
                {
                    return Err(self.unexpected("transaction", DEFAULT_REASON));
                }
                modes.push(format!("ISOLATION LEVEL {}", self.get_curr_literal()));
                self.next();
            } else {
                break;
            }
            if self.is(TokenKind::Comma) {
                self.next();
            }
        }
        Ok(modes)
    }

    pub fn parse_start_transaction(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let modes = self.parse_transaction_modes()?;
        Ok(Statement::StartTransaction(TransactionStatement { modes }))
    }

    pub fn parse_set_transaction(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let modes = self.parse_transaction_modes()?;
        Ok(Statement::SetTransaction(TransactionStatement { modes }))
    }

    pub fn parse_savepoint(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("savepoint", IDENT_EXPECTED));
        }
        let name = self.get_curr_literal();
        self.next();
        Ok(Statement::Savepoint(name))
    }

    pub fn parse_release(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("release", IDENT_EXPECTED));
        }
        let name = self.get_curr_literal();
        self.next();
        Ok(Statement::ReleaseSavepoint(name))
    }

    pub fn parse_rollback_to_savepoint(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("rollback", IDENT_EXPECTED));
        }
        let name = self.get_curr_literal();
        self.next();
        Ok(Statement::Rollback(Some(name)))
    }

    pub fn parse_commit(&mut self) -> Result<Statement, ParseError> {
        self.next();
        Ok(Statement::Commit)
    }

    pub fn parse_rollback(&mut self) -> Result<Statement, ParseError> {
        self.next();
        Ok(Statement::Rollback(None))
    }

    // -- permissions --------------------------------------------------------

    fn parse_privileges(&mut self) -> Result<Vec<String>, ParseError> {
        let mut privileges = Vec::new();
        loop {
            if !self.is(TokenKind::Keyword) && !self.is(TokenKind::Ident) {
                return Err(self.unexpected("privileges", IDENT_EXPECTED));
            }
            privileges.push(self.get_curr_literal());
            self.next();
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(privileges)
    }

    fn parse_user_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut users = Vec::new();
        loop {
            if !self.is(TokenKind::Ident) && !self.is(TokenKind::Literal) {
                return Err(self.unexpected("grantee", IDENT_EXPECTED));
            }
            users.push(self.get_curr_literal());
            self.next();
            if self.is(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        Ok(users)
    }

    pub fn parse_grant(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let privileges = self.parse_privileges()?;
        if !self.is_keyword("ON") {
            return Err(self.unexpected("grant", keyword_expected("ON")));
        }
        self.next();
        let object = match self.parse_identifier()? {
            Statement::Name(name) => name.ident(),
            _ => String::new(),
        };
        if !self.is_keyword("TO") {
            return Err(self.unexpected("grant", keyword_expected("TO")));
        }
        self.next();
        let users = self.parse_user_list()?;
        Ok(Statement::Grant(GrantStatement {
            privileges,
            object,
            users,
        }))
    }

    pub fn parse_revoke(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let privileges = self.parse_privileges()?;
        if !self.is_keyword("ON") {
            return Err(self.unexpected("revoke", keyword_expected("ON")));
        }
        self.next();
        let object = match self.parse_identifier()? {
            Statement::Name(name) => name.ident(),
            _ => String::new(),
        };
        if !self.is_keyword("FROM") {
            return Err(self.unexpected("revoke", keyword_expected("FROM")));
        }
        self.next();
        let users = self.parse_user_list()?;
        Ok(Statement::Revoke(RevokeStatement {
            privileges,
            object,
            users,
        }))
    }
}
