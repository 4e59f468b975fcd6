//! Pratt expression parsing.
//!
//! Prefix and infix handlers live in the parser's stacked symbol tables so
//! dialects can override individual entries, and `ROW(...)` can push the
//! default tables to momentarily shut custom entries out.

use squill_ast::{
    Alias, Between, Binary, Cast, CaseStatement, Collate, FunctionCall, In, Is, Name, Placeholder,
    Statement, Type, Unary, Value, When, WindowDef,
};

use crate::parser::{
    FuncSet, InfixFn, ParseError, Parser, PrefixFn, DEFAULT_REASON, IDENT_EXPECTED,
    MISSING_CLOSE_PAREN, UNKNOWN_OPERATOR, VALUE_EXPECTED,
};
use crate::parser::{is_expression_keyword, keyword_expected, Power};
use crate::token::{kw, Symbol, TokenKind};

pub(crate) fn default_prefix_set() -> FuncSet<PrefixFn> {
    let mut set: FuncSet<PrefixFn> = FuncSet::new();
    set.register("", TokenKind::Ident, Parser::parse_ident);
    set.register("", TokenKind::Star, Parser::parse_identifier);
    set.register("", TokenKind::Literal, Parser::parse_literal);
    set.register("", TokenKind::Number, Parser::parse_literal);
    set.register("", TokenKind::Lparen, Parser::parse_group_expr);
    set.register("", TokenKind::Minus, Parser::parse_unary);
    set.register("", TokenKind::Placeholder, Parser::parse_placeholder);
    set.register("", TokenKind::NamedHolder, Parser::parse_placeholder);
    set.register("", TokenKind::PositionHolder, Parser::parse_placeholder);
    set.register("", TokenKind::Keyword, Parser::parse_unary);
    set.register("CASE", TokenKind::Keyword, Parser::parse_case);
    set.register("SELECT", TokenKind::Keyword, Parser::parse_statement);
    set.register("EXISTS", TokenKind::Keyword, Parser::parse_exists);
    set.register("CAST", TokenKind::Keyword, Parser::parse_cast);
    set.register("ROW", TokenKind::Keyword, Parser::parse_row);
    set
}

pub(crate) fn default_infix_set() -> FuncSet<InfixFn> {
    let mut set: FuncSet<InfixFn> = FuncSet::new();
    for kind in [
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Slash,
        TokenKind::Star,
        TokenKind::Concat,
        TokenKind::Eq,
        TokenKind::Ne,
        TokenKind::Lt,
        TokenKind::Le,
        TokenKind::Gt,
        TokenKind::Ge,
    ] {
        set.register("", kind, Parser::parse_infix_expr);
    }
    set.register("", TokenKind::Lparen, Parser::parse_call_expr);
    for kw in [
        "AND", "OR", "LIKE", "ILIKE", "SIMILAR", "BETWEEN", "IN", "IS", "ISNULL", "NOTNULL",
        "NOT",
    ] {
        set.register(kw, TokenKind::Keyword, Parser::parse_keyword_expr);
    }
    set.register("COLLATE", TokenKind::Keyword, Parser::parse_collate_expr);
    set
}

impl Parser {
    /// Parse one full expression at the lowest binding power.
    pub fn start_expression(&mut self) -> Result<Statement, ParseError> {
        self.parse_expression(Power::Lowest)
    }

    pub(crate) fn parse_expression(&mut self, power: Power) -> Result<Statement, ParseError> {
        let prefix = self.get_prefix()?;
        let mut left = prefix(self)?;
        while !self.stop_expression(power) {
            let infix = self.get_infix()?;
            left = infix(self, left)?;
        }
        Ok(left)
    }

    fn stop_expression(&mut self, power: Power) -> bool {
        if self.query_ends() || self.is(TokenKind::Comma) {
            return true;
        }
        if self.is_keyword("AS") && !is_expression_keyword("AS") {
            return true;
        }
        self.current_binding() <= power
    }

    fn get_prefix(&self) -> Result<PrefixFn, ParseError> {
        let sym = self.curr().symbol();
        self.prefix
            .get(&sym)
            .or_else(|| {
                (sym.kind == TokenKind::Keyword)
                    .then(|| self.prefix.get(&Symbol::of(TokenKind::Keyword)))
                    .flatten()
            })
            .ok_or_else(|| self.unexpected("prefix", DEFAULT_REASON))
    }

    fn get_infix(&self) -> Result<InfixFn, ParseError> {
        self.infix
            .get(&self.curr().symbol())
            .ok_or_else(|| self.unexpected("infix", UNKNOWN_OPERATOR))
    }

    /// Push the default handler tables; used to scope out dialect entries.
    pub fn set_default_funcs(&mut self) {
        self.prefix.push(default_prefix_set());
        self.infix.push(default_infix_set());
    }

    /// Pop the tables pushed by [`Parser::set_default_funcs`].
    pub fn unset_funcs(&mut self) {
        self.prefix.pop();
        self.infix.pop();
    }

    // -- prefix handlers ----------------------------------------------------

    /// A dotted identifier (or `*`), without alias handling.
    pub fn parse_identifier(&mut self) -> Result<Statement, ParseError> {
        let mut name = Name::default();
        while self.peek_is(TokenKind::Dot) {
            name.parts.push(self.get_curr_literal());
            self.next();
            self.next();
        }
        if !self.is(TokenKind::Ident) && !self.is(TokenKind::Star) {
            return Err(self.unexpected("identifier", IDENT_EXPECTED));
        }
        name.parts.push(self.get_curr_literal());
        self.next();
        Ok(Statement::Name(name))
    }

    /// An identifier with optional alias.
    pub fn parse_ident(&mut self) -> Result<Statement, ParseError> {
        let stmt = self.parse_identifier()?;
        self.parse_alias(stmt)
    }

    /// Attach `[AS] alias` when the current token can be an alias.
    pub fn parse_alias(&mut self, stmt: Statement) -> Result<Statement, ParseError> {
        let mandatory = self.is_keyword("AS");
        if mandatory {
            self.next();
        }
        if self.curr().is_value() {
            let alias = self.get_curr_literal();
            self.next();
            return Ok(Statement::Alias(Alias {
                inner: Box::new(stmt),
                alias,
                uses_as: mandatory,
            }));
        }
        if mandatory {
            return Err(self.unexpected("alias", IDENT_EXPECTED));
        }
        Ok(stmt)
    }

    pub fn parse_literal(&mut self) -> Result<Statement, ParseError> {
        let literal = if self.is(TokenKind::Literal) {
            format!("'{}'", self.get_curr_literal().replace('\'', "''"))
        } else {
            self.get_curr_literal()
        };
        self.next();
        Ok(Statement::Value(Value::new(literal)))
    }

    /// One of the SQL constants usable after `IS` and friends.
    pub fn parse_constant(&mut self) -> Result<Statement, ParseError> {
        if !self.is(TokenKind::Keyword) {
            return Err(self.unexpected("constant", "expected predefined SQL constant"));
        }
        match self.get_curr_literal().as_str() {
            kw::TRUE | kw::FALSE | kw::UNKNOWN | kw::NULL | kw::DEFAULT => self.parse_literal(),
            _ => Err(self.unexpected("constant", "unknown value")),
        }
    }

    pub fn parse_placeholder(&mut self) -> Result<Statement, ParseError> {
        let stmt = match self.curr().kind {
            TokenKind::Placeholder => Placeholder::default(),
            TokenKind::NamedHolder => Placeholder {
                inner: Some(Box::new(Statement::Name(Name::bare(
                    self.get_curr_literal(),
                )))),
            },
            TokenKind::PositionHolder => {
                if self.get_curr_literal().parse::<u32>().is_err() {
                    return Err(self.unexpected("placeholder", VALUE_EXPECTED));
                }
                Placeholder {
                    inner: Some(Box::new(Statement::Value(Value::new(
                        self.get_curr_literal(),
                    )))),
                }
            }
            _ => return Err(self.unexpected("placeholder", DEFAULT_REASON)),
        };
        self.next();
        Ok(Statement::Placeholder(stmt))
    }

    pub fn parse_unary(&mut self) -> Result<Statement, ParseError> {
        if self.is(TokenKind::Minus) {
            self.next();
            let right = self.start_expression()?;
            return Ok(Statement::Unary(Unary {
                op: "-".into(),
                right: Box::new(right),
            }));
        }
        if self.is_keyword("NOT") {
            self.next();
            let inner = self.start_expression()?;
            return Ok(Statement::Not(Box::new(inner)));
        }
        if self.is_keyword("CASE") {
            return self.parse_case();
        }
        if self.is(TokenKind::Keyword)
            && matches!(
                self.get_curr_literal().as_str(),
                kw::NULL | kw::DEFAULT | kw::TRUE | kw::FALSE | kw::UNKNOWN
            )
        {
            return self.parse_literal();
        }
        Err(self.unexpected("unary", UNKNOWN_OPERATOR))
    }

    /// `( expr )`, `( SELECT … )` or `( VALUES … )`.
    pub fn parse_group_expr(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if self.is_keyword("SELECT") || self.is_keyword("VALUES") {
            let stmt = self.parse_statement()?;
            self.expect("group", TokenKind::Rparen)?;
            let group = Statement::Group(Box::new(stmt));
            return self.parse_alias(group);
        }
        let stmt = self.start_expression()?;
        self.expect("group", TokenKind::Rparen)?;
        Ok(Statement::Group(Box::new(stmt)))
    }

    pub fn parse_exists(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if !self.is(TokenKind::Lparen) {
            return Err(self.unexpected("exists", crate::parser::MISSING_OPEN_PAREN));
        }
        self.next();
        let stmt = self.parse_statement()?;
        self.expect("exists", TokenKind::Rparen)?;
        Ok(Statement::Exists(Box::new(stmt)))
    }

    pub fn parse_cast(&mut self) -> Result<Statement, ParseError> {
        self.next();
        self.expect("cast", TokenKind::Lparen)?;
        let ident = self.parse_identifier()?;
        if !self.is_keyword("AS") {
            return Err(self.unexpected("cast", keyword_expected("AS")));
        }
        self.next();
        let ty = self.parse_type()?;
        self.expect("cast", TokenKind::Rparen)?;
        Ok(Statement::Cast(Cast {
            ident: Box::new(ident),
            ty,
        }))
    }

    /// A type name with optional length and precision.
    pub fn parse_type(&mut self) -> Result<Type, ParseError> {
        if !self.is(TokenKind::Ident) {
            return Err(self.unexpected("type", IDENT_EXPECTED));
        }
        let mut ty = Type {
            name: self.get_curr_literal(),
            ..Type::default()
        };
        self.next();
        if self.is(TokenKind::Lparen) {
            self.next();
            ty.length = Some(self.parse_size("type")?);
            if self.is(TokenKind::Comma) {
                self.next();
                ty.precision = Some(self.parse_size("type")?);
            }
            self.expect("type", TokenKind::Rparen)?;
        }
        Ok(ty)
    }

    fn parse_size(&mut self, ctx: &str) -> Result<u32, ParseError> {
        let size = self
            .get_curr_literal()
            .parse::<u32>()
            .map_err(|_| self.unexpected(ctx, VALUE_EXPECTED))?;
        self.next();
        Ok(size)
    }

    /// `ROW(expr, …)` parsed under the default handler tables.
    pub fn parse_row(&mut self) -> Result<Statement, ParseError> {
        self.next();
        if !self.is(TokenKind::Lparen) {
            return Err(self.unexpected("row", crate::parser::MISSING_OPEN_PAREN));
        }
        self.next();
        self.set_default_funcs();
        let result = self.parse_row_values();
        self.unset_funcs();
        result
    }

    fn parse_row_values(&mut self) -> Result<Statement, ParseError> {
        let mut values = Vec::new();
        while !self.done() && !self.is(TokenKind::Rparen) {
            let expr = self.start_expression()?;
            self.ensure_end("row", TokenKind::Comma, TokenKind::Rparen)?;
            values.push(expr);
        }
        self.expect("row", TokenKind::Rparen)?;
        Ok(Statement::Row(values))
    }

    /// `CASE [operand] WHEN … THEN … [ELSE …] END` with an optional alias.
    pub fn parse_case(&mut self) -> Result<Statement, ParseError> {
        self.next();
        let mut stmt = CaseStatement {
            cdt: None,
            body: Vec::new(),
            alt: None,
        };
        if !self.is_keyword("WHEN") {
            stmt.cdt = Some(Box::new(self.start_expression()?));
        }
        while self.is_keyword("WHEN") {
            self.next();
            let cdt = self.start_expression()?;
            if !self.is_keyword("THEN") {
                return Err(self.unexpected("case", keyword_expected("THEN")));
            }
            self.next();
            let body = self.parse_case_body()?;
            stmt.body.push(When {
                cdt: Box::new(cdt),
                body: Box::new(body),
            });
        }
        if stmt.body.is_empty() {
            return Err(self.unexpected("case", keyword_expected("WHEN")));
        }
        if self.is_keyword("ELSE") {
            self.next();
            stmt.alt = Some(Box::new(self.parse_case_body()?));
        }
        if !self.is_keyword("END") {
            return Err(self.unexpected("case", keyword_expected("END")));
        }
        self.next();
        self.parse_alias(Statement::Case(stmt))
    }

    /// A `WHEN`/`ELSE` body: a nested statement when the next token opens
    /// one, an expression otherwise. A statement body keeps its terminating
    /// `;` when the `CASE` continues after it.
    fn parse_case_body(&mut self) -> Result<Statement, ParseError> {
        if self.is(TokenKind::Keyword) && self.has_statement(&self.get_curr_literal()) {
            let stmt = self.parse_statement()?;
            if self.is(TokenKind::Eol)
                && (self.peek_is_keyword("WHEN")
                    || self.peek_is_keyword("ELSE")
                    || self.peek_is_keyword("END"))
            {
                self.next();
            }
            Ok(stmt)
        } else {
            self.start_expression()
        }
    }

    // -- infix handlers -----------------------------------------------------

    pub fn parse_infix_expr(&mut self, left: Statement) -> Result<Statement, ParseError> {
        let op = operand_for(self.curr().kind)
            .ok_or_else(|| self.unexpected("infix", UNKNOWN_OPERATOR))?;
        let pow = self.current_binding();
        self.next();
        let right = if self.is_keyword("ALL") || self.is_keyword("ANY") || self.is_keyword("SOME")
        {
            self.parse_all_or_any()?
        } else {
            self.parse_expression(pow)?
        };
        Ok(Statement::Binary(Binary {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
        }))
    }

    fn parse_all_or_any(&mut self) -> Result<Statement, ParseError> {
        let all = self.is_keyword("ALL");
        self.next();
        if !self.is(TokenKind::Lparen) {
            return Err(self.unexpected("all/any", crate::parser::MISSING_OPEN_PAREN));
        }
        self.next();
        let stmt = self.parse_statement()?;
        if !self.is(TokenKind::Rparen) {
            return Err(self.unexpected("all/any", MISSING_CLOSE_PAREN));
        }
        self.next();
        if all {
            Ok(Statement::All(Box::new(stmt)))
        } else {
            Ok(Statement::Any(Box::new(stmt)))
        }
    }

    /// Keyword-introduced infix forms, with a leading `NOT` folded into a
    /// wrapping [`Statement::Not`].
    pub fn parse_keyword_expr(&mut self, left: Statement) -> Result<Statement, ParseError> {
        let mut negated = false;
        if self.is_keyword("NOT") {
            negated = true;
            self.next();
        }
        let stmt = match self.get_curr_literal().as_str() {
            "AND" | "OR" => self.parse_relational(left)?,
            "LIKE" | "ILIKE" | "SIMILAR" => self.parse_like(left)?,
            "BETWEEN" => self.parse_between(left)?,
            "IN" => self.parse_in(left)?,
            "IS" => self.parse_is(left)?,
            "ISNULL" => self.parse_isnull(left)?,
            "NOTNULL" => return self.parse_notnull(left),
            _ => return Err(self.unexpected("expression", UNKNOWN_OPERATOR)),
        };
        if negated {
            Ok(Statement::Not(Box::new(stmt)))
        } else {
            Ok(stmt)
        }
    }

    fn parse_relational(&mut self, left: Statement) -> Result<Statement, ParseError> {
        let op = self.get_curr_literal();
        let pow = self.current_binding();
        self.next();
        let right = self.parse_expression(pow)?;
        Ok(Statement::Binary(Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }))
    }

    fn parse_like(&mut self, left: Statement) -> Result<Statement, ParseError> {
        // LIKE / ILIKE / SIMILAR are recorded verbatim as binary operators.
        self.parse_relational(left)
    }

    fn parse_between(&mut self, left: Statement) -> Result<Statement, ParseError> {
        self.next();
        let lower = self.parse_expression(Power::Rel)?;
        if !self.is_keyword("AND") {
            return Err(self.unexpected("between", keyword_expected("AND")));
        }
        self.next();
        let upper = self.parse_expression(Power::Rel)?;
        Ok(Statement::Between(Between {
            ident: Box::new(left),
            lower: Box::new(lower),
            upper: Box::new(upper),
        }))
    }

    fn parse_in(&mut self, left: Statement) -> Result<Statement, ParseError> {
        self.next();
        let value = if self.is(TokenKind::Lparen) && self.peek_is_keyword("SELECT") {
            self.parse_expression(Power::Lowest)?
        } else if self.is(TokenKind::Lparen) {
            self.next();
            let mut list = Vec::new();
            while !self.done() && !self.is(TokenKind::Rparen) {
                let value = self.parse_expression(Power::Lowest)?;
                if self.is(TokenKind::Comma) {
                    self.next();
                    if self.is(TokenKind::Rparen) {
                        return Err(self.unexpected("in", MISSING_CLOSE_PAREN));
                    }
                } else if !self.is(TokenKind::Rparen) {
                    return Err(self.unexpected("in", DEFAULT_REASON));
                }
                list.push(value);
            }
            self.expect("in", TokenKind::Rparen)?;
            Statement::List(list)
        } else {
            self.parse_identifier()?
        };
        Ok(Statement::In(In {
            ident: Box::new(left),
            value: Box::new(value),
        }))
    }

    fn parse_is(&mut self, left: Statement) -> Result<Statement, ParseError> {
        self.next();
        let negated = self.is_keyword("NOT");
        if negated {
            self.next();
        }
        let value = self.parse_constant()?;
        let stmt = Statement::Is(Is {
            ident: Box::new(left),
            value: Box::new(value),
        });
        if negated {
            Ok(Statement::Not(Box::new(stmt)))
        } else {
            Ok(stmt)
        }
    }

    fn parse_isnull(&mut self, left: Statement) -> Result<Statement, ParseError> {
        self.next();
        Ok(Statement::Is(Is {
            ident: Box::new(left),
            value: Box::new(Statement::Value(Value::new(kw::NULL))),
        }))
    }

    fn parse_notnull(&mut self, left: Statement) -> Result<Statement, ParseError> {
        self.next();
        let stmt = Statement::Is(Is {
            ident: Box::new(left),
            value: Box::new(Statement::Value(Value::new(kw::NULL))),
        });
        Ok(Statement::Not(Box::new(stmt)))
    }

    pub fn parse_collate_expr(&mut self, left: Statement) -> Result<Statement, ParseError> {
        self.next();
        if !self.is(TokenKind::Ident) && !self.is(TokenKind::Literal) {
            return Err(self.unexpected("collate", IDENT_EXPECTED));
        }
        let collation = self.get_curr_literal();
        self.next();
        Ok(Statement::Collate(Collate {
            inner: Box::new(left),
            collation,
        }))
    }

    /// `name(args)` with optional `DISTINCT`, `FILTER (WHERE …)` and
    /// `OVER (window | name)`.
    pub fn parse_call_expr(&mut self, left: Statement) -> Result<Statement, ParseError> {
        if !matches!(left, Statement::Name(_)) {
            return Err(self.unexpected("call", IDENT_EXPECTED));
        }
        self.next();
        let mut call = FunctionCall {
            ident: Box::new(left),
            distinct: self.is_keyword("DISTINCT"),
            args: Vec::new(),
            filter: None,
            over: None,
        };
        if call.distinct {
            self.next();
        }
        while !self.done() && !self.is(TokenKind::Rparen) {
            let arg = self.start_expression()?;
            self.ensure_end("call", TokenKind::Comma, TokenKind::Rparen)?;
            call.args.push(arg);
        }
        self.expect("call", TokenKind::Rparen)?;
        if self.is_keyword("FILTER") {
            self.next();
            self.expect("call", TokenKind::Lparen)?;
            if !self.is_keyword("WHERE") {
                return Err(self.unexpected("call", keyword_expected("WHERE")));
            }
            self.next();
            call.filter = Some(Box::new(self.start_expression()?));
            self.expect("call", TokenKind::Rparen)?;
        }
        call.over = self.parse_over()?;
        self.parse_alias(Statement::FunctionCall(call))
    }

    fn parse_over(&mut self) -> Result<Option<Box<Statement>>, ParseError> {
        if !self.is_keyword("OVER") {
            return Ok(None);
        }
        self.next();
        if !self.is(TokenKind::Lparen) {
            let name = self.parse_identifier()?;
            return Ok(Some(Box::new(name)));
        }
        let window = self.parse_window_spec()?;
        Ok(Some(Box::new(Statement::WindowDef(window))))
    }

    /// A parenthesised window specification.
    pub(crate) fn parse_window_spec(&mut self) -> Result<WindowDef, ParseError> {
        self.expect("window", TokenKind::Lparen)?;
        let mut def = WindowDef::default();
        if self.is_keyword("PARTITION BY") {
            self.next();
            while !self.done() && !self.is(TokenKind::Rparen) {
                def.partitions.push(self.start_expression()?);
                if !self.is(TokenKind::Comma) {
                    break;
                }
                self.next();
            }
        }
        if self.is_keyword("ORDER BY") {
            self.next();
            loop {
                def.orders.push(self.parse_order_term()?);
                if !self.is(TokenKind::Comma) {
                    break;
                }
                self.next();
            }
        }
        if self.is(TokenKind::Keyword)
            && matches!(self.get_curr_literal().as_str(), "ROWS" | "RANGE" | "GROUPS")
        {
            def.frame = Some(self.parse_frame_spec()?);
        }
        self.expect("window", TokenKind::Rparen)?;
        Ok(def)
    }

    fn parse_frame_spec(&mut self) -> Result<squill_ast::FrameSpec, ParseError> {
        let unit = self.get_curr_literal();
        self.next();
        let (start, end) = if self.is_keyword("BETWEEN") {
            self.next();
            let start = self.parse_frame_bound()?;
            if !self.is_keyword("AND") {
                return Err(self.unexpected("window", keyword_expected("AND")));
            }
            self.next();
            (start, Some(self.parse_frame_bound()?))
        } else {
            (self.parse_frame_bound()?, None)
        };
        let mut exclude = None;
        if self.is(TokenKind::Keyword) && self.get_curr_literal().starts_with("EXCLUDE ") {
            exclude = Some(self.get_curr_literal()["EXCLUDE ".len()..].to_string());
            self.next();
        }
        Ok(squill_ast::FrameSpec {
            unit,
            start,
            end,
            exclude,
        })
    }

    fn parse_frame_bound(&mut self) -> Result<squill_ast::FrameBound, ParseError> {
        use squill_ast::FrameBound;
        if self.is_keyword("UNBOUNDED PRECEDING") {
            self.next();
            return Ok(FrameBound::UnboundedPreceding);
        }
        if self.is_keyword("UNBOUNDED FOLLOWING") {
            self.next();
            return Ok(FrameBound::UnboundedFollowing);
        }
        if self.is_keyword("CURRENT ROW") {
            self.next();
            return Ok(FrameBound::CurrentRow);
        }
        let expr = self.start_expression()?;
        if self.is_keyword("PRECEDING") {
            self.next();
            Ok(FrameBound::Preceding(Box::new(expr)))
        } else if self.is_keyword("FOLLOWING") {
            self.next();
            Ok(FrameBound::Following(Box::new(expr)))
        } else {
            Err(self.unexpected("window", keyword_expected("PRECEDING")))
        }
    }

    /// One `ORDER BY` term: expression, optional direction (`ASC`, `DESC`
    /// or a comparison operator after `USING`), optional nulls placement.
    pub(crate) fn parse_order_term(&mut self) -> Result<Statement, ParseError> {
        let inner = self.start_expression()?;
        let mut order = squill_ast::Order {
            inner: Box::new(inner),
            orient: None,
            nulls: None,
        };
        if self.is_keyword("ASC") || self.is_keyword("DESC") {
            order.orient = Some(self.get_curr_literal());
            self.next();
        } else if self.is_keyword("USING") {
            self.next();
            order.orient = operand_for(self.curr().kind)
                .filter(|op| matches!(*op, "<" | "<=" | ">" | ">="))
                .map(String::from);
            if order.orient.is_none() {
                return Err(self.unexpected("order by", UNKNOWN_OPERATOR));
            }
            self.next();
        }
        if self.is_keyword("NULLS") {
            self.next();
            if !self.is_keyword("FIRST") && !self.is_keyword("LAST") {
                return Err(self.unexpected("order by", keyword_expected("FIRST")));
            }
            order.nulls = Some(self.get_curr_literal());
            self.next();
        }
        Ok(Statement::Order(order))
    }
}

fn operand_for(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Plus => Some("+"),
        TokenKind::Minus => Some("-"),
        TokenKind::Slash => Some("/"),
        TokenKind::Star => Some("*"),
        TokenKind::Eq => Some("="),
        TokenKind::Ne => Some("<>"),
        TokenKind::Gt => Some(">"),
        TokenKind::Ge => Some(">="),
        TokenKind::Lt => Some("<"),
        TokenKind::Le => Some("<="),
        TokenKind::Concat => Some("||"),
        _ => None,
    }
}
