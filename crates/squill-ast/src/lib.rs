//! SQL abstract syntax tree for the squill toolchain.
//!
//! Every SQL construct the parser understands is a variant of [`Statement`]:
//! queries, mutations, DDL, procedural control flow, transaction control and
//! expressions all share the one sum type, because SQL freely nests them
//! (a projection column may be a subquery, an `IN` right-hand side may be a
//! `SELECT`, a `CASE` arm may hold a statement). Exhaustive `match` over the
//! enum replaces the run-time type probing a dynamically-typed tree would
//! need, and the compiler flags every missing case when a variant is added.

mod display;
mod helpers;

pub use helpers::{
    get_aliases_from, names_from, projection_names, split_where, split_where_literal,
};

use std::fmt;

// ---------------------------------------------------------------------------
// Position — source location tracking
// ---------------------------------------------------------------------------

/// A line/column/byte-offset triple into the original SQL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Line number, 1-based.
    pub line: u32,
    /// Column number, 1-based.
    pub column: u32,
    /// Byte offset from the start of the input.
    pub offset: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ---------------------------------------------------------------------------
// Top-level statement
// ---------------------------------------------------------------------------

/// A single parsed SQL statement or expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    // Queries
    Select(SelectStatement),
    Values(Vec<Statement>),
    Union(CompoundStatement),
    Intersect(CompoundStatement),
    Except(CompoundStatement),
    With(WithStatement),
    Cte(CteStatement),

    // Mutations
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Merge(MergeStatement),
    Truncate(TruncateStatement),

    // DDL
    CreateTable(CreateTableStatement),
    AlterTable(AlterTableStatement),
    DropTable(DropStatement),
    CreateView(CreateViewStatement),
    DropView(DropStatement),
    CreateProcedure(CreateProcedureStatement),

    // Procedural control flow
    Begin(Vec<Statement>),
    If(IfStatement),
    While(WhileStatement),
    Return(Option<Box<Statement>>),
    Declare(DeclareStatement),
    Set(SetStatement),
    Call(CallStatement),

    // Transaction control
    StartTransaction(TransactionStatement),
    SetTransaction(TransactionStatement),
    Savepoint(String),
    ReleaseSavepoint(String),
    Commit,
    Rollback(Option<String>),

    // Permissions
    Grant(GrantStatement),
    Revoke(RevokeStatement),

    // Expressions
    Name(Name),
    Value(Value),
    Placeholder(Placeholder),
    Alias(Alias),
    FunctionCall(FunctionCall),
    Binary(Binary),
    Unary(Unary),
    Not(Box<Statement>),
    In(In),
    Is(Is),
    Between(Between),
    Exists(Box<Statement>),
    All(Box<Statement>),
    Any(Box<Statement>),
    Cast(Cast),
    Collate(Collate),
    Row(Vec<Statement>),
    List(Vec<Statement>),
    Group(Box<Statement>),
    Case(CaseStatement),

    // Clause nodes appearing in generic statement lists
    Join(Join),
    Order(Order),
    WindowDef(WindowDef),

    // Decoration
    Commented(Commented),
    Node(Box<Statement>),
}

impl Statement {
    /// Peel decoration wrappers (`Commented`, `Node`) off a statement so rule
    /// code can inspect the payload without descending manually.
    #[must_use]
    pub fn unwrap(&self) -> &Statement {
        match self {
            Statement::Commented(c) => c.inner.unwrap(),
            Statement::Node(inner) => inner.unwrap(),
            other => other,
        }
    }

    /// Like [`Statement::unwrap`] but consuming, for transforms that rebuild
    /// the tree.
    #[must_use]
    pub fn into_unwrapped(self) -> Statement {
        match self {
            Statement::Commented(c) => c.inner.into_unwrapped(),
            Statement::Node(inner) => inner.into_unwrapped(),
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Names, values, placeholders
// ---------------------------------------------------------------------------

/// A possibly-qualified identifier: `column`, `table.column`,
/// `schema.table.column` or the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name {
    /// Dotted parts, leftmost first. Never empty once built by the parser.
    pub parts: Vec<String>,
}

impl Name {
    #[must_use]
    pub fn bare(ident: impl Into<String>) -> Self {
        Self {
            parts: vec![ident.into()],
        }
    }

    /// The full dotted identifier. An empty trailing part renders as `*`.
    #[must_use]
    pub fn ident(&self) -> String {
        if self.parts.is_empty() {
            return "*".into();
        }
        let mut parts = self.parts.clone();
        if let Some(last) = parts.last_mut() {
            if last.is_empty() {
                *last = "*".into();
            }
        }
        parts.join(".")
    }

    /// The last (unqualified) part.
    #[must_use]
    pub fn name(&self) -> String {
        match self.parts.last() {
            Some(s) if !s.is_empty() => s.clone(),
            _ => "*".into(),
        }
    }

    /// The schema qualifier, when present.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        match self.parts.len() {
            2 => Some(&self.parts[0]),
            3 => Some(&self.parts[1]),
            _ => None,
        }
    }
}

/// A literal value carried as its source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub literal: String,
}

impl Value {
    #[must_use]
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
        }
    }
}

/// A bind-parameter placeholder. `inner` is `None` for the anonymous `?`,
/// a [`Name`] for `:name` and a [`Value`] for `$n`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placeholder {
    pub inner: Option<Box<Statement>>,
}

// ---------------------------------------------------------------------------
// Expression nodes
// ---------------------------------------------------------------------------

/// `expr [AS] alias`. The `uses_as` flag records whether the `AS` keyword
/// appeared, which the linter inspects for consistency.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub inner: Box<Statement>,
    pub alias: String,
    pub uses_as: bool,
}

/// A function invocation with the standard-SQL trimmings.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub ident: Box<Statement>,
    pub distinct: bool,
    pub args: Vec<Statement>,
    pub filter: Option<Box<Statement>>,
    pub over: Option<Box<Statement>>,
}

const SQL_AGGREGATES: &[&str] = &["max", "min", "avg", "sum", "count"];

impl FunctionCall {
    /// The called identifier, or `?` when the callee is not a plain name.
    #[must_use]
    pub fn ident_name(&self) -> String {
        match self.ident.as_ref() {
            Statement::Name(n) => n.ident(),
            _ => "?".into(),
        }
    }

    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        SQL_AGGREGATES.contains(&self.ident_name().to_ascii_lowercase().as_str())
    }
}

/// A binary operation. The operator is kept as its canonical source spelling
/// (`=`, `<>`, `AND`, `LIKE`, …) so rewrites can canonicalise spellings.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub left: Box<Statement>,
    pub op: String,
    pub right: Box<Statement>,
}

impl Binary {
    /// Whether this node chains predicates rather than comparing values.
    #[must_use]
    pub fn is_relation(&self) -> bool {
        self.op == "AND" || self.op == "OR"
    }
}

/// Canonicalise a non-standard operator spelling (`!=` → `<>`, `==` → `=`).
#[must_use]
pub fn replace_op(mut bin: Binary) -> Binary {
    bin.op = match bin.op.as_str() {
        "!=" => "<>".into(),
        "==" => "=".into(),
        other => other.into(),
    };
    bin
}

/// Canonicalise expression shape: a binary `IN`/`NOT IN` against a singleton
/// list collapses to `=` / `<>`.
#[must_use]
pub fn replace_expr(bin: Binary) -> Statement {
    let op = match bin.op.as_str() {
        "IN" => "=",
        "NOT IN" => "<>",
        _ => return Statement::Binary(bin),
    };
    match *bin.right {
        Statement::List(values) if values.len() == 1 => {
            let mut values = values;
            Statement::Binary(Binary {
                left: bin.left,
                op: op.into(),
                right: Box::new(values.remove(0)),
            })
        }
        right => Statement::Binary(Binary {
            left: bin.left,
            op: bin.op,
            right: Box::new(right),
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub op: String,
    pub right: Box<Statement>,
}

/// `ident IN value` where `value` is a [`Statement::List`], a subquery or a
/// bare identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct In {
    pub ident: Box<Statement>,
    pub value: Box<Statement>,
}

/// `ident IS value` where `value` is one of the SQL constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Is {
    pub ident: Box<Statement>,
    pub value: Box<Statement>,
}

/// `ident BETWEEN lower AND upper`. Both bounds are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub ident: Box<Statement>,
    pub lower: Box<Statement>,
    pub upper: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub ident: Box<Statement>,
    pub ty: Type,
}

/// A column type as written: name plus up to two size parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Type {
    pub name: String,
    pub length: Option<u32>,
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collate {
    pub inner: Box<Statement>,
    pub collation: String,
}

/// `CASE [operand] WHEN … THEN … [ELSE …] END`. `body` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseStatement {
    pub cdt: Option<Box<Statement>>,
    pub body: Vec<When>,
    pub alt: Option<Box<Statement>>,
}

/// One `WHEN cdt THEN body` arm. The body may be a nested statement when the
/// source puts a keyword there.
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    pub cdt: Box<Statement>,
    pub body: Box<Statement>,
}

// ---------------------------------------------------------------------------
// Query statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub columns: Vec<Statement>,
    pub tables: Vec<Statement>,
    pub where_clause: Option<Box<Statement>>,
    pub groups: Vec<Statement>,
    pub having: Option<Box<Statement>>,
    pub windows: Vec<Statement>,
    pub orders: Vec<Statement>,
    pub limit: Option<Limit>,
}

/// `LIMIT count [OFFSET skip]`, also produced by `FETCH FIRST/NEXT n ROWS
/// ONLY` and a bare `OFFSET`. A present count is validated non-negative at
/// parse time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Limit {
    pub count: Option<i64>,
    pub offset: Option<i64>,
}

/// `UNION` / `INTERSECT` / `EXCEPT` between two query bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStatement {
    pub left: Box<Statement>,
    pub right: Box<Statement>,
    pub all: bool,
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStatement {
    pub recursive: bool,
    /// Every entry is a [`Statement::Cte`].
    pub queries: Vec<Statement>,
    pub body: Box<Statement>,
}

/// Whether a CTE carries a materialisation hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Materialized {
    #[default]
    Unspecified,
    Materialized,
    NotMaterialized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CteStatement {
    pub ident: String,
    pub columns: Vec<String>,
    pub materialized: Materialized,
    pub body: Box<Statement>,
}

/// A joined table in a `FROM` list: join keyword, joined table and the `ON`
/// predicate (a [`Binary`]) or `USING` column list (a [`Statement::List`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: String,
    pub table: Box<Statement>,
    pub cond: Option<Box<Statement>>,
}

/// One `ORDER BY` term with optional direction and nulls placement. The
/// direction may be a comparison operator for dialects with `USING op`.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub inner: Box<Statement>,
    pub orient: Option<String>,
    pub nulls: Option<String>,
}

/// A window specification, either named in a `WINDOW` clause or inline after
/// `OVER`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowDef {
    pub ident: Option<String>,
    pub partitions: Vec<Statement>,
    pub orders: Vec<Statement>,
    pub frame: Option<FrameSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    /// `ROWS`, `RANGE` or `GROUPS`.
    pub unit: String,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
    pub exclude: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    UnboundedPreceding,
    UnboundedFollowing,
    CurrentRow,
    Preceding(Box<Statement>),
    Following(Box<Statement>),
}

// ---------------------------------------------------------------------------
// Mutation statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: Box<Statement>,
    pub columns: Vec<String>,
    /// A `VALUES` body or a query.
    pub source: Box<Statement>,
    pub upsert: Option<Upsert>,
    pub returning: Option<Box<Statement>>,
}

/// `ON CONFLICT [(columns)] DO NOTHING | DO UPDATE SET … [WHERE …]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Upsert {
    pub columns: Vec<String>,
    /// `None` means `DO NOTHING`.
    pub action: Option<Vec<Assignment>>,
    pub where_clause: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// A [`Name`] or a [`Statement::List`] of names.
    pub field: Statement,
    pub value: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: Box<Statement>,
    pub set: Vec<Assignment>,
    pub tables: Vec<Statement>,
    pub where_clause: Option<Box<Statement>>,
    pub returning: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: Box<Statement>,
    pub where_clause: Option<Box<Statement>>,
    pub returning: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeStatement {
    pub target: Box<Statement>,
    pub source: Box<Statement>,
    pub on: Box<Statement>,
    pub actions: Vec<MergeAction>,
}

/// One `WHEN [NOT] MATCHED [AND cdt] THEN action` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeAction {
    pub matched: bool,
    pub cdt: Option<Box<Statement>>,
    pub action: MergeOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOp {
    Update(Vec<Assignment>),
    Delete,
    Insert {
        columns: Vec<String>,
        values: Vec<Statement>,
    },
    DoNothing,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TruncateStatement {
    pub only: bool,
    pub tables: Vec<Statement>,
    pub identity: Option<String>,
    pub cascade: bool,
    pub restrict: bool,
}

// ---------------------------------------------------------------------------
// DDL statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub temp: bool,
    pub not_exists: bool,
    pub name: Box<Statement>,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: Type,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: Option<String>,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    PrimaryKey {
        columns: Vec<String>,
    },
    ForeignKey {
        locals: Vec<String>,
        table: String,
        remotes: Vec<String>,
    },
    Unique {
        columns: Vec<String>,
    },
    NotNull,
    Check {
        expr: Box<Statement>,
    },
    Default {
        expr: Box<Statement>,
    },
    Generated {
        expr: Box<Statement>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub name: Box<Statement>,
    pub action: AlterTableAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    RenameTable {
        name: String,
    },
    RenameColumn {
        src: String,
        dst: String,
    },
    RenameConstraint {
        src: String,
        dst: String,
    },
    AddColumn {
        def: ColumnDef,
        not_exists: bool,
    },
    DropColumn {
        name: String,
        exists: bool,
    },
    AddConstraint {
        constraint: Constraint,
    },
    DropConstraint {
        name: String,
        exists: bool,
    },
}

/// `DROP TABLE` / `DROP VIEW`, distinguished by the enclosing variant.
#[derive(Debug, Clone, PartialEq)]
pub struct DropStatement {
    pub name: Box<Statement>,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewStatement {
    pub temp: bool,
    pub name: Box<Statement>,
    pub columns: Vec<String>,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateProcedureStatement {
    pub replace: bool,
    pub name: String,
    pub parameters: Vec<ProcedureParam>,
    pub language: Option<String>,
    pub deterministic: Option<bool>,
    pub data_access: Option<DataAccess>,
    pub null_input: bool,
    pub options: Vec<Assignment>,
    pub body: Vec<Statement>,
}

/// How a procedure body interacts with SQL data, as declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAccess {
    ModifiesSql,
    ReadsSql,
    ContainsSql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamMode {
    #[default]
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureParam {
    pub mode: ParamMode,
    pub name: String,
    pub ty: Type,
    pub default: Option<Box<Statement>>,
}

// ---------------------------------------------------------------------------
// Procedural statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub cdt: Box<Statement>,
    pub csq: Vec<Statement>,
    /// `ELSE` branch; an `ELSIF` chain nests another `If` here.
    pub alt: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub cdt: Box<Statement>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclareStatement {
    pub ident: String,
    pub ty: Type,
    pub value: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetStatement {
    pub ident: Name,
    pub value: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallStatement {
    pub ident: Box<Statement>,
    /// Argument names for `name -> value` named-argument syntax, in order.
    pub names: Vec<String>,
    pub args: Vec<Statement>,
}

// ---------------------------------------------------------------------------
// Transactions and permissions
// ---------------------------------------------------------------------------

/// `START TRANSACTION` / `SET TRANSACTION` with access and isolation modes
/// recorded as their keyword phrases.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionStatement {
    pub modes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantStatement {
    pub privileges: Vec<String>,
    pub object: String,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeStatement {
    pub privileges: Vec<String>,
    pub object: String,
    pub users: Vec<String>,
}

// ---------------------------------------------------------------------------
// Decoration
// ---------------------------------------------------------------------------

/// A statement together with the comment lines immediately before it and at
/// most one trailing comment on the closing line.
#[derive(Debug, Clone, PartialEq)]
pub struct Commented {
    pub before: Vec<String>,
    pub after: Option<String>,
    pub inner: Box<Statement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_ident_and_parts() {
        let n = Name {
            parts: vec!["s".into(), "t".into(), "c".into()],
        };
        assert_eq!(n.ident(), "s.t.c");
        assert_eq!(n.name(), "c");
        assert_eq!(n.schema(), Some("t"));

        let star = Name {
            parts: vec![String::new()],
        };
        assert_eq!(star.ident(), "*");
        assert_eq!(star.name(), "*");
    }

    #[test]
    fn unwrap_peels_decoration() {
        let inner = Statement::Value(Value::new("1"));
        let wrapped = Statement::Commented(Commented {
            before: vec!["-- note".into()],
            after: None,
            inner: Box::new(Statement::Node(Box::new(inner.clone()))),
        });
        assert_eq!(wrapped.unwrap(), &inner);
        assert_eq!(wrapped.into_unwrapped(), inner);
    }

    #[test]
    fn replace_op_canonicalises_spelling() {
        let bin = Binary {
            left: Box::new(Statement::Name(Name::bare("a"))),
            op: "!=".into(),
            right: Box::new(Statement::Value(Value::new("1"))),
        };
        assert_eq!(replace_op(bin).op, "<>");
    }

    #[test]
    fn replace_expr_collapses_singleton_in() {
        let bin = Binary {
            left: Box::new(Statement::Name(Name::bare("x"))),
            op: "IN".into(),
            right: Box::new(Statement::List(vec![Statement::Value(Value::new("1"))])),
        };
        match replace_expr(bin) {
            Statement::Binary(b) => {
                assert_eq!(b.op, "=");
                assert_eq!(*b.right, Statement::Value(Value::new("1")));
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn aggregate_detection_is_case_insensitive() {
        let call = FunctionCall {
            ident: Box::new(Statement::Name(Name::bare("MAX"))),
            distinct: false,
            args: vec![],
            filter: None,
            over: None,
        };
        assert!(call.is_aggregate());
        let call = FunctionCall {
            ident: Box::new(Statement::Name(Name::bare("substr"))),
            ..call
        };
        assert!(!call.is_aggregate());
    }
}
