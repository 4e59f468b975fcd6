//! SQL parser core.
//!
//! Statements dispatch through a keyword-phrase table; expressions run
//! through a Pratt loop over stacked prefix/infix handler tables. Both
//! tables are per-parser and support registration and unregistration, which
//! is how dialects graft their syntax onto the standard grammar. Input
//! arrives through a stack of frames so `#INCLUDE` can splice files into the
//! token stream.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::{error, fmt};

use squill_ast::{Position, Statement};
use squill_config::Config;

use crate::keywords::{self, KeywordSet};
use crate::scanner::Scanner;
use crate::token::{Symbol, Token, TokenKind};

// ---------------------------------------------------------------------------
// Parse metrics
// ---------------------------------------------------------------------------

/// Monotonic counter of successfully parsed statements.
static SQUILL_PARSE_STATEMENTS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Point-in-time parse metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseMetricsSnapshot {
    /// Total statements successfully parsed.
    pub squill_parse_statements_total: u64,
}

/// Take a point-in-time snapshot of parse metrics.
#[must_use]
pub fn parse_metrics_snapshot() -> ParseMetricsSnapshot {
    ParseMetricsSnapshot {
        squill_parse_statements_total: SQUILL_PARSE_STATEMENTS_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset parse metrics (used by tests and diagnostics).
pub fn reset_parse_metrics() {
    SQUILL_PARSE_STATEMENTS_TOTAL.store(0, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Error type and reason strings
// ---------------------------------------------------------------------------

pub(crate) const DEFAULT_REASON: &str = "one or more errors have been detected in your query";
pub(crate) const MISSING_OPEN_PAREN: &str =
    "missing opening parenthesis before expression/statement";
pub(crate) const MISSING_CLOSE_PAREN: &str =
    "missing closing parenthesis after expression/statement";
pub(crate) const IDENT_EXPECTED: &str = "a valid identifier is expected";
pub(crate) const VALUE_EXPECTED: &str = "a valid value expected (number, boolean, identifier)";
pub(crate) const MISSING_EOL: &str = "missing semicolon at end of statement";
pub(crate) const UNKNOWN_OPERATOR: &str = "unknown operator";
pub(crate) const MACRO_OPTION_UNKNOWN: &str = "macro option unknown";
pub(crate) const MACRO_UNKNOWN: &str = "unknown macro given";

pub(crate) fn keyword_expected(kw: &str) -> String {
    format!("keyword {kw} expected")
}

/// A parse diagnostic: dialect, grammar context, offending token and a
/// human-readable reason, anchored to a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub dialect: String,
    pub context: String,
    pub reason: String,
    pub literal: String,
    pub pos: Position,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}): at {}, unexpected token {}: {}",
            self.dialect, self.context, self.pos, self.literal, self.reason
        )
    }
}

impl error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Handler tables
// ---------------------------------------------------------------------------

pub type StatementFn = fn(&mut Parser) -> Result<Statement, ParseError>;
pub type PrefixFn = fn(&mut Parser) -> Result<Statement, ParseError>;
pub type InfixFn = fn(&mut Parser, Statement) -> Result<Statement, ParseError>;

pub(crate) struct FuncSet<T: Copy> {
    funcs: HashMap<Symbol, T>,
}

impl<T: Copy> FuncSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            funcs: HashMap::new(),
        }
    }

    pub(crate) fn register(&mut self, literal: &str, kind: TokenKind, f: T) {
        self.funcs.insert(symbol_for(kind, literal), f);
    }

    pub(crate) fn unregister(&mut self, literal: &str, kind: TokenKind) {
        self.funcs.remove(&symbol_for(kind, literal));
    }
}

/// A push-down stack of handler tables. Registration touches the top table;
/// lookup searches top-down, so a scoped push shadows without erasing.
pub(crate) struct FuncStack<T: Copy> {
    sets: Vec<FuncSet<T>>,
}

impl<T: Copy> FuncStack<T> {
    pub(crate) fn new(base: FuncSet<T>) -> Self {
        Self { sets: vec![base] }
    }

    pub(crate) fn push(&mut self, set: FuncSet<T>) {
        self.sets.push(set);
    }

    pub(crate) fn pop(&mut self) {
        if self.sets.len() > 1 {
            self.sets.pop();
        }
    }

    pub(crate) fn register(&mut self, literal: &str, kind: TokenKind, f: T) {
        if let Some(top) = self.sets.last_mut() {
            top.register(literal, kind, f);
        }
    }

    pub(crate) fn unregister(&mut self, literal: &str, kind: TokenKind) {
        if let Some(top) = self.sets.last_mut() {
            top.unregister(literal, kind);
        }
    }

    pub(crate) fn get(&self, sym: &Symbol) -> Option<T> {
        self.sets.iter().rev().find_map(|s| s.funcs.get(sym)).copied()
    }
}

fn symbol_for(kind: TokenKind, literal: &str) -> Symbol {
    if kind == TokenKind::Keyword {
        Symbol::keyword(literal)
    } else {
        Symbol::of(kind)
    }
}

// ---------------------------------------------------------------------------
// Binding powers
// ---------------------------------------------------------------------------

/// Pratt binding powers, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Power {
    Lowest,
    Rel,
    Cmp,
    Kw,
    Not,
    Concat,
    Add,
    Mul,
    Unary,
    Call,
}

pub(crate) fn binding_of(tok: &Token) -> Power {
    match tok.kind {
        TokenKind::Keyword => match tok.literal.as_str() {
            "AND" | "OR" => Power::Rel,
            "NOT" => Power::Not,
            "LIKE" | "ILIKE" | "SIMILAR" | "BETWEEN" | "IN" => Power::Cmp,
            "IS" | "ISNULL" | "NOTNULL" | "COLLATE" => Power::Kw,
            _ => Power::Lowest,
        },
        TokenKind::Eq
        | TokenKind::Ne
        | TokenKind::Lt
        | TokenKind::Le
        | TokenKind::Gt
        | TokenKind::Ge => Power::Cmp,
        TokenKind::Plus | TokenKind::Minus => Power::Add,
        TokenKind::Star | TokenKind::Slash => Power::Mul,
        TokenKind::Concat => Power::Concat,
        TokenKind::Lparen => Power::Call,
        _ => Power::Lowest,
    }
}

pub(crate) fn is_expression_keyword(kw: &str) -> bool {
    matches!(
        kw,
        "AND"
            | "OR"
            | "NOT"
            | "LIKE"
            | "ILIKE"
            | "SIMILAR"
            | "BETWEEN"
            | "IN"
            | "IS"
            | "ISNULL"
            | "NOTNULL"
            | "COLLATE"
    )
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One input stream: its scanner, the directory include paths resolve
/// against, and the current/peek tokens.
pub(crate) struct Frame {
    scan: Scanner,
    pub(crate) base: PathBuf,
    pub(crate) curr: Token,
    pub(crate) peek: Token,
}

impl Frame {
    pub(crate) fn new(mut scan: Scanner, base: PathBuf) -> Self {
        let curr = scan.scan();
        let peek = scan.scan();
        Self {
            scan,
            base,
            curr,
            peek,
        }
    }

    pub(crate) fn next(&mut self) {
        self.curr = std::mem::replace(&mut self.peek, self.scan.scan());
    }

    pub(crate) fn done(&self) -> bool {
        self.curr.kind == TokenKind::Eof
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Nesting limit for statements and subqueries, preventing runaway recursion
/// on adversarial input.
pub const MAX_PARSE_DEPTH: u32 = 512;

/// Include frames stacked past this depth indicate a cycle.
pub(crate) const MAX_INCLUDE_DEPTH: usize = 16;

pub struct Parser {
    pub(crate) frame: Frame,
    pub(crate) stack: Vec<Frame>,
    pub(crate) keywords: Arc<KeywordSet>,
    pub(crate) dialect: &'static str,

    level: u32,
    statements: HashMap<String, StatementFn>,
    pub(crate) prefix: FuncStack<PrefixFn>,
    pub(crate) infix: FuncStack<InfixFn>,

    /// Options collected from `#FORMAT` / `#LINT` macros.
    pub config: Config,
}

impl Parser {
    /// A parser over the standard-SQL grammar and keyword corpus.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_keywords(source, keywords::standard())
    }

    /// A parser with a merged keyword set; the set is prepared here.
    #[must_use]
    pub fn with_keywords(source: impl Into<String>, mut set: KeywordSet) -> Self {
        set.prepare();
        let keywords = Arc::new(set);
        let scan = Scanner::new(source, Arc::clone(&keywords));
        Self::from_scanner(scan, keywords)
    }

    /// A parser over an already-configured scanner; used by dialects that
    /// install lexing hooks before parsing starts.
    #[must_use]
    pub fn from_scanner(scan: Scanner, keywords: Arc<KeywordSet>) -> Self {
        let mut parser = Self {
            frame: Frame::new(scan, PathBuf::from(".")),
            stack: Vec::new(),
            keywords,
            dialect: "ansi",
            level: 0,
            statements: HashMap::new(),
            prefix: FuncStack::new(crate::expr::default_prefix_set()),
            infix: FuncStack::new(crate::expr::default_infix_set()),
            config: Config::new(),
        };
        crate::stmt::register_standard(&mut parser);
        parser
    }

    /// The directory `#INCLUDE` paths resolve against; callers parsing a
    /// file set this to the file's directory.
    pub fn set_base_dir(&mut self, base: impl AsRef<Path>) {
        self.frame.base = base.as_ref().to_path_buf();
    }

    // -- registration -------------------------------------------------------

    pub fn register_statement(&mut self, kw: &str, f: StatementFn) {
        self.statements.insert(kw.to_ascii_uppercase(), f);
    }

    pub fn unregister_statement(&mut self, kw: &str) {
        self.statements.remove(&kw.to_ascii_uppercase());
    }

    pub fn unregister_all_statements(&mut self) {
        self.statements.clear();
    }

    /// Whether a statement parse function is registered for the phrase.
    #[must_use]
    pub fn has_statement(&self, kw: &str) -> bool {
        self.statements.contains_key(&kw.to_ascii_uppercase())
    }

    pub fn register_prefix(&mut self, literal: &str, kind: TokenKind, f: PrefixFn) {
        self.prefix.register(literal, kind, f);
    }

    pub fn unregister_prefix(&mut self, literal: &str, kind: TokenKind) {
        self.prefix.unregister(literal, kind);
    }

    pub fn register_infix(&mut self, literal: &str, kind: TokenKind, f: InfixFn) {
        self.infix.register(literal, kind, f);
    }

    pub fn unregister_infix(&mut self, literal: &str, kind: TokenKind) {
        self.infix.unregister(literal, kind);
    }

    // -- batch driving ------------------------------------------------------

    /// Parse the next statement. `Ok(None)` signals a clean end of input.
    /// On error the parser has already skipped to the next statement
    /// boundary, so callers can keep going and collect every diagnostic.
    pub fn parse(&mut self) -> Result<Option<Statement>, ParseError> {
        match self.parse_commented() {
            Err(err) => {
                self.restore();
                Err(err)
            }
            ok => ok,
        }
    }

    /// Parse the whole input, collecting statements and diagnostics.
    pub fn parse_all(&mut self) -> (Vec<Statement>, Vec<ParseError>) {
        let span = tracing::debug_span!(
            target: "squill.parse",
            "parse",
            statements = tracing::field::Empty,
            errors = tracing::field::Empty,
        );
        let _guard = span.enter();

        let mut stmts = Vec::new();
        let mut errors = Vec::new();
        loop {
            match self.parse() {
                Ok(Some(stmt)) => {
                    SQUILL_PARSE_STATEMENTS_TOTAL.fetch_add(1, Ordering::Relaxed);
                    stmts.push(stmt);
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(
                        target: "squill.parse",
                        error = %err,
                        "parse recovery: skipping malformed statement"
                    );
                    errors.push(err);
                }
            }
        }
        span.record("statements", stmts.len() as u64);
        span.record("errors", errors.len() as u64);
        (stmts, errors)
    }

    /// Skip to just past the next statement terminator.
    fn restore(&mut self) {
        while !self.done() && !self.is(TokenKind::Eol) {
            self.next();
        }
        self.next();
    }

    fn parse_commented(&mut self) -> Result<Option<Statement>, ParseError> {
        let mut before = Vec::new();
        while self.is(TokenKind::Comment) {
            before.push(self.get_curr_literal());
            self.next();
        }
        if self.is(TokenKind::Macro) {
            self.parse_macro()?;
            return self.parse_commented();
        }
        if self.done() {
            return Ok(None);
        }
        let stmt = self.parse_statement()?;
        if !self.is(TokenKind::Eol) {
            return Err(self.unexpected("statement", MISSING_EOL));
        }
        let eol_line = self.frame.curr.pos.line;
        self.next();
        let mut after = None;
        if self.is(TokenKind::Comment) && self.frame.curr.pos.line == eol_line {
            after = Some(self.get_curr_literal());
            self.next();
        }
        if before.is_empty() && after.is_none() {
            Ok(Some(stmt))
        } else {
            Ok(Some(Statement::Commented(squill_ast::Commented {
                before,
                after,
                inner: Box::new(stmt),
            })))
        }
    }

    /// Dispatch one statement through the keyword table.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        self.enter()?;
        let result = self.parse_statement_inner();
        self.leave();
        result
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, ParseError> {
        if self.done() {
            return Err(self.unexpected("statement", DEFAULT_REASON));
        }
        if !self.is(TokenKind::Keyword) {
            return Err(self.unexpected("statement", "a statement keyword is expected"));
        }
        let f = self
            .statements
            .get(self.frame.curr.literal.as_str())
            .copied()
            .ok_or_else(|| self.unexpected("statement", DEFAULT_REASON))?;
        f(self)
    }

    // -- nesting ------------------------------------------------------------

    pub(crate) fn enter(&mut self) -> Result<(), ParseError> {
        if self.level >= MAX_PARSE_DEPTH {
            return Err(self.unexpected("statement", "statement tree is too deep"));
        }
        self.level += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Whether the current token ends a query body: end of input, the
    /// top-level `;`, or the `)` closing a subquery.
    pub(crate) fn query_ends(&mut self) -> bool {
        self.done() || self.is(TokenKind::Eol) || self.is(TokenKind::Rparen)
    }

    // -- token navigation ---------------------------------------------------

    #[must_use]
    pub fn curr(&self) -> &Token {
        &self.frame.curr
    }

    #[must_use]
    pub fn peek(&self) -> &Token {
        &self.frame.peek
    }

    pub fn next(&mut self) {
        self.frame.next();
    }

    /// End-of-input check; pops a finished include frame and resumes the
    /// outer stream.
    pub fn done(&mut self) -> bool {
        if self.frame.done() {
            if let Some(outer) = self.stack.pop() {
                self.frame = outer;
            }
        }
        self.frame.done()
    }

    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.frame.curr.kind == kind
    }

    #[must_use]
    pub fn peek_is(&self, kind: TokenKind) -> bool {
        self.frame.peek.kind == kind
    }

    #[must_use]
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.frame.curr.kind == TokenKind::Keyword && self.frame.curr.literal == kw
    }

    #[must_use]
    pub fn peek_is_keyword(&self, kw: &str) -> bool {
        self.frame.peek.kind == TokenKind::Keyword && self.frame.peek.literal == kw
    }

    #[must_use]
    pub fn get_curr_literal(&self) -> String {
        self.frame.curr.literal.clone()
    }

    pub(crate) fn current_binding(&self) -> Power {
        binding_of(&self.frame.curr)
    }

    /// Expect and consume a token kind.
    pub fn expect(&mut self, ctx: &str, kind: TokenKind) -> Result<(), ParseError> {
        if !self.is(kind) {
            let reason = match kind {
                TokenKind::Lparen => MISSING_OPEN_PAREN,
                TokenKind::Rparen => MISSING_CLOSE_PAREN,
                TokenKind::Eol => MISSING_EOL,
                _ => DEFAULT_REASON,
            };
            return Err(self.unexpected(ctx, reason));
        }
        self.next();
        Ok(())
    }

    /// After a list item: consume the separator (rejecting a dangling one
    /// before `end`) or leave the terminator in place.
    pub fn ensure_end(&mut self, ctx: &str, sep: TokenKind, end: TokenKind) -> Result<(), ParseError> {
        if self.is(sep) {
            self.next();
            if self.is(end) {
                return Err(self.unexpected(ctx, DEFAULT_REASON));
            }
        } else if !self.is(end) {
            return Err(self.unexpected(ctx, DEFAULT_REASON));
        }
        Ok(())
    }

    /// Variant of [`Parser::ensure_end`] whose end condition is "any
    /// keyword", used by CTE lists.
    pub(crate) fn ensure_end_kw(&mut self, ctx: &str, sep: TokenKind) -> Result<(), ParseError> {
        if self.is(sep) {
            self.next();
            if self.is(TokenKind::Keyword) {
                return Err(self.unexpected(ctx, "unexpected keyword after comma"));
            }
        } else if !self.is(TokenKind::Keyword) {
            return Err(self.unexpected(ctx, DEFAULT_REASON));
        }
        Ok(())
    }

    // -- errors -------------------------------------------------------------

    pub fn unexpected(&self, ctx: &str, reason: impl Into<String>) -> ParseError {
        ParseError {
            dialect: self.dialect.to_string(),
            context: ctx.to_string(),
            reason: reason.into(),
            literal: self.frame.curr.to_string(),
            pos: self.frame.curr.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn func_stack_scoped_lookup() {
        fn a(_: &mut Parser) -> Result<Statement, ParseError> {
            unreachable!()
        }
        fn b(_: &mut Parser) -> Result<Statement, ParseError> {
            unreachable!()
        }
        let mut base = FuncSet::<PrefixFn>::new();
        base.register("", TokenKind::Ident, a);
        let mut stack = FuncStack::new(base);

        let sym = Symbol::of(TokenKind::Ident);
        let addr = |f: Option<PrefixFn>| f.map(|f| f as usize);
        assert_eq!(addr(stack.get(&sym)), Some(a as PrefixFn as usize));

        // A pushed set shadows; popping restores.
        let mut scoped = FuncSet::<PrefixFn>::new();
        scoped.register("", TokenKind::Ident, b);
        stack.push(scoped);
        assert_eq!(addr(stack.get(&sym)), Some(b as PrefixFn as usize));
        stack.pop();
        assert_eq!(addr(stack.get(&sym)), Some(a as PrefixFn as usize));

        // Lookup falls through a scoped set that lacks the entry.
        stack.push(FuncSet::new());
        assert_eq!(addr(stack.get(&sym)), Some(a as PrefixFn as usize));
    }

    #[test]
    fn binding_power_ordering() {
        assert!(Power::Rel < Power::Cmp);
        assert!(Power::Cmp < Power::Kw);
        assert!(Power::Not < Power::Concat);
        assert!(Power::Concat < Power::Add);
        assert!(Power::Add < Power::Mul);
        assert!(Power::Mul < Power::Call);
    }

    #[test]
    fn statement_registration_is_case_insensitive() {
        fn noop(p: &mut Parser) -> Result<Statement, ParseError> {
            p.next();
            Ok(Statement::Commit)
        }
        let mut parser = Parser::new("commit;");
        parser.register_statement("commit", noop);
        let stmt = parser.parse().expect("parse").expect("statement");
        assert_eq!(stmt, Statement::Commit);
    }

    #[test]
    fn parse_error_mentions_position_and_reason() {
        let mut parser = Parser::new("select a b c from t;");
        let err = parser.parse().expect_err("should fail");
        assert_eq!(err.dialect, "ansi");
        assert!(err.pos.line >= 1);
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn recovery_resumes_at_next_statement() {
        let mut parser = Parser::new("select from;\nselect 1;\nselect 2;");
        let (stmts, errors) = parser.parse_all();
        assert_eq!(errors.len(), 1);
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn metrics_count_statements() {
        // Tests run concurrently, so compare against a snapshot delta.
        let before = parse_metrics_snapshot().squill_parse_statements_total;
        let mut parser = Parser::new("select 1; select 2;");
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty());
        assert_eq!(stmts.len(), 2);
        let after = parse_metrics_snapshot().squill_parse_statements_total;
        assert!(after >= before + 2);
    }
}
