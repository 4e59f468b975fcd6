//! Canonical SQL rendering via `fmt::Display`.
//!
//! This is the single-line, fixed-style rendering used by tests and the
//! `ast` dump. The configurable pretty-printer is a separate subsystem; the
//! canonical form only promises that `parse(render(ast))` reproduces an
//! equivalent tree.

use crate::*;
use std::fmt;

fn comma_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn ident_list(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(item)?;
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(s) => write!(f, "{s}"),
            Statement::Values(rows) => {
                f.write_str("VALUES ")?;
                comma_list(f, rows)
            }
            Statement::Union(c) => write_compound(f, "UNION", c),
            Statement::Intersect(c) => write_compound(f, "INTERSECT", c),
            Statement::Except(c) => write_compound(f, "EXCEPT", c),
            Statement::With(w) => write!(f, "{w}"),
            Statement::Cte(c) => write!(f, "{c}"),
            Statement::Insert(s) => write!(f, "{s}"),
            Statement::Update(s) => write!(f, "{s}"),
            Statement::Delete(s) => write!(f, "{s}"),
            Statement::Merge(s) => write!(f, "{s}"),
            Statement::Truncate(s) => write!(f, "{s}"),
            Statement::CreateTable(s) => write!(f, "{s}"),
            Statement::AlterTable(s) => write!(f, "{s}"),
            Statement::DropTable(s) => {
                f.write_str("DROP TABLE ")?;
                if s.exists {
                    f.write_str("IF EXISTS ")?;
                }
                write!(f, "{}", s.name)
            }
            Statement::CreateView(s) => write!(f, "{s}"),
            Statement::DropView(s) => {
                f.write_str("DROP VIEW ")?;
                if s.exists {
                    f.write_str("IF EXISTS ")?;
                }
                write!(f, "{}", s.name)
            }
            Statement::CreateProcedure(s) => write!(f, "{s}"),
            Statement::Begin(body) => {
                f.write_str("BEGIN ")?;
                for stmt in body {
                    write!(f, "{stmt}; ")?;
                }
                f.write_str("END")
            }
            Statement::If(s) => write!(f, "{s}"),
            Statement::While(s) => write!(f, "{s}"),
            Statement::Return(value) => match value {
                Some(v) => write!(f, "RETURN {v}"),
                None => f.write_str("RETURN"),
            },
            Statement::Declare(s) => write!(f, "{s}"),
            Statement::Set(s) => write!(f, "SET {} = {}", s.ident.ident(), s.value),
            Statement::Call(s) => write!(f, "{s}"),
            Statement::StartTransaction(t) => {
                f.write_str("START TRANSACTION")?;
                for m in &t.modes {
                    write!(f, " {m}")?;
                }
                Ok(())
            }
            Statement::SetTransaction(t) => {
                f.write_str("SET TRANSACTION")?;
                for m in &t.modes {
                    write!(f, " {m}")?;
                }
                Ok(())
            }
            Statement::Savepoint(name) => write!(f, "SAVEPOINT {name}"),
            Statement::ReleaseSavepoint(name) => write!(f, "RELEASE SAVEPOINT {name}"),
            Statement::Commit => f.write_str("COMMIT"),
            Statement::Rollback(savepoint) => match savepoint {
                Some(name) => write!(f, "ROLLBACK TO SAVEPOINT {name}"),
                None => f.write_str("ROLLBACK"),
            },
            Statement::Grant(g) => {
                f.write_str("GRANT ")?;
                ident_list(f, &g.privileges)?;
                write!(f, " ON {} TO ", g.object)?;
                ident_list(f, &g.users)
            }
            Statement::Revoke(r) => {
                f.write_str("REVOKE ")?;
                ident_list(f, &r.privileges)?;
                write!(f, " ON {} FROM ", r.object)?;
                ident_list(f, &r.users)
            }
            Statement::Name(n) => f.write_str(&n.ident()),
            Statement::Value(v) => f.write_str(&v.literal),
            Statement::Placeholder(p) => match p.inner.as_deref() {
                None => f.write_str("?"),
                Some(Statement::Name(n)) => write!(f, ":{}", n.ident()),
                Some(Statement::Value(v)) => write!(f, "${}", v.literal),
                Some(other) => write!(f, "{other}"),
            },
            Statement::Alias(a) => {
                if a.uses_as {
                    write!(f, "{} AS {}", a.inner, a.alias)
                } else {
                    write!(f, "{} {}", a.inner, a.alias)
                }
            }
            Statement::FunctionCall(c) => write!(f, "{c}"),
            Statement::Binary(b) => write!(f, "{} {} {}", b.left, b.op, b.right),
            Statement::Unary(u) => {
                if u.op.chars().all(|c| c.is_ascii_alphabetic()) {
                    write!(f, "{} {}", u.op, u.right)
                } else {
                    write!(f, "{}{}", u.op, u.right)
                }
            }
            Statement::Not(inner) => write!(f, "NOT {inner}"),
            Statement::In(i) => write!(f, "{} IN {}", i.ident, i.value),
            Statement::Is(i) => write!(f, "{} IS {}", i.ident, i.value),
            Statement::Between(b) => {
                write!(f, "{} BETWEEN {} AND {}", b.ident, b.lower, b.upper)
            }
            Statement::Exists(inner) => write!(f, "EXISTS ({inner})"),
            Statement::All(inner) => write!(f, "ALL ({inner})"),
            Statement::Any(inner) => write!(f, "ANY ({inner})"),
            Statement::Cast(c) => write!(f, "CAST({} AS {})", c.ident, c.ty),
            Statement::Collate(c) => write!(f, "{} COLLATE {}", c.inner, c.collation),
            Statement::Row(values) => {
                f.write_str("ROW(")?;
                comma_list(f, values)?;
                f.write_str(")")
            }
            Statement::List(values) => {
                f.write_str("(")?;
                comma_list(f, values)?;
                f.write_str(")")
            }
            Statement::Group(inner) => write!(f, "({inner})"),
            Statement::Case(c) => write!(f, "{c}"),
            Statement::Join(j) => write!(f, "{j}"),
            Statement::Order(o) => write!(f, "{o}"),
            Statement::WindowDef(w) => write!(f, "{w}"),
            Statement::Commented(c) => write!(f, "{}", c.inner),
            Statement::Node(inner) => write!(f, "{inner}"),
        }
    }
}

fn write_compound(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    c: &CompoundStatement,
) -> fmt::Result {
    write!(f, "{} {keyword}", c.left)?;
    if c.all {
        f.write_str(" ALL")?;
    }
    if c.distinct {
        f.write_str(" DISTINCT")?;
    }
    write!(f, " {}", c.right)
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        comma_list(f, &self.columns)?;
        if !self.tables.is_empty() {
            f.write_str(" FROM ")?;
            for (i, table) in self.tables.iter().enumerate() {
                if i > 0 {
                    if matches!(table.unwrap(), Statement::Join(_)) {
                        f.write_str(" ")?;
                    } else {
                        f.write_str(", ")?;
                    }
                }
                write!(f, "{table}")?;
            }
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.groups.is_empty() {
            f.write_str(" GROUP BY ")?;
            comma_list(f, &self.groups)?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.windows.is_empty() {
            f.write_str(" WINDOW ")?;
            comma_list(f, &self.windows)?;
        }
        if !self.orders.is_empty() {
            f.write_str(" ORDER BY ")?;
            comma_list(f, &self.orders)?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " {limit}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(count) = self.count {
            write!(f, "LIMIT {count}")?;
            if let Some(offset) = self.offset {
                write!(f, " OFFSET {offset}")?;
            }
            return Ok(());
        }
        if let Some(offset) = self.offset {
            write!(f, "OFFSET {offset}")?;
        }
        Ok(())
    }
}

impl fmt::Display for WithStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WITH ")?;
        if self.recursive {
            f.write_str("RECURSIVE ")?;
        }
        comma_list(f, &self.queries)?;
        write!(f, " {}", self.body)
    }
}

impl fmt::Display for CteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ident)?;
        if !self.columns.is_empty() {
            f.write_str(" (")?;
            ident_list(f, &self.columns)?;
            f.write_str(")")?;
        }
        f.write_str(" AS ")?;
        match self.materialized {
            Materialized::Unspecified => {}
            Materialized::Materialized => f.write_str("MATERIALIZED ")?,
            Materialized::NotMaterialized => f.write_str("NOT MATERIALIZED ")?,
        }
        write!(f, "({})", self.body)
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO {}", self.table)?;
        if !self.columns.is_empty() {
            f.write_str(" (")?;
            ident_list(f, &self.columns)?;
            f.write_str(")")?;
        }
        write!(f, " {}", self.source)?;
        if let Some(upsert) = &self.upsert {
            write!(f, " {upsert}")?;
        }
        if let Some(returning) = &self.returning {
            write!(f, " RETURNING {returning}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Upsert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ON CONFLICT")?;
        if !self.columns.is_empty() {
            f.write_str(" (")?;
            ident_list(f, &self.columns)?;
            f.write_str(")")?;
        }
        match &self.action {
            None => f.write_str(" DO NOTHING"),
            Some(assignments) => {
                f.write_str(" DO UPDATE SET ")?;
                comma_list(f, assignments)?;
                if let Some(where_clause) = &self.where_clause {
                    write!(f, " WHERE {where_clause}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.field, self.value)
    }
}

impl fmt::Display for UpdateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE {} SET ", self.table)?;
        comma_list(f, &self.set)?;
        if !self.tables.is_empty() {
            f.write_str(" FROM ")?;
            comma_list(f, &self.tables)?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if let Some(returning) = &self.returning {
            write!(f, " RETURNING {returning}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DeleteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {}", self.table)?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if let Some(returning) = &self.returning {
            write!(f, " RETURNING {returning}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MergeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MERGE INTO {} USING {} ON {}",
            self.target, self.source, self.on
        )?;
        for action in &self.actions {
            write!(f, " {action}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matched {
            f.write_str("WHEN MATCHED")?;
        } else {
            f.write_str("WHEN NOT MATCHED")?;
        }
        if let Some(cdt) = &self.cdt {
            write!(f, " AND {cdt}")?;
        }
        f.write_str(" THEN ")?;
        match &self.action {
            MergeOp::Update(assignments) => {
                f.write_str("UPDATE SET ")?;
                comma_list(f, assignments)
            }
            MergeOp::Delete => f.write_str("DELETE"),
            MergeOp::Insert { columns, values } => {
                f.write_str("INSERT ")?;
                if !columns.is_empty() {
                    f.write_str("(")?;
                    ident_list(f, columns)?;
                    f.write_str(") ")?;
                }
                f.write_str("VALUES (")?;
                comma_list(f, values)?;
                f.write_str(")")
            }
            MergeOp::DoNothing => f.write_str("DO NOTHING"),
        }
    }
}

impl fmt::Display for TruncateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TRUNCATE ")?;
        if self.only {
            f.write_str("ONLY ")?;
        }
        comma_list(f, &self.tables)?;
        if let Some(identity) = &self.identity {
            write!(f, " {} IDENTITY", identity.to_ascii_uppercase())?;
        }
        if self.cascade {
            f.write_str(" CASCADE")?;
        }
        if self.restrict {
            f.write_str(" RESTRICT")?;
        }
        Ok(())
    }
}

impl fmt::Display for CreateTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE ")?;
        if self.temp {
            f.write_str("TEMPORARY ")?;
        }
        f.write_str("TABLE ")?;
        if self.not_exists {
            f.write_str("IF NOT EXISTS ")?;
        }
        write!(f, "{} (", self.name)?;
        let mut first = true;
        for column in &self.columns {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{column}")?;
        }
        for constraint in &self.constraints {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{constraint}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)?;
        for constraint in &self.constraints {
            write!(f, " {constraint}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "CONSTRAINT {name} ")?;
        }
        match &self.kind {
            ConstraintKind::PrimaryKey { columns } => {
                f.write_str("PRIMARY KEY")?;
                if !columns.is_empty() {
                    f.write_str(" (")?;
                    ident_list(f, columns)?;
                    f.write_str(")")?;
                }
                Ok(())
            }
            ConstraintKind::ForeignKey {
                locals,
                table,
                remotes,
            } => {
                if !locals.is_empty() {
                    f.write_str("FOREIGN KEY (")?;
                    ident_list(f, locals)?;
                    f.write_str(") ")?;
                }
                write!(f, "REFERENCES {table}")?;
                if !remotes.is_empty() {
                    f.write_str(" (")?;
                    ident_list(f, remotes)?;
                    f.write_str(")")?;
                }
                Ok(())
            }
            ConstraintKind::Unique { columns } => {
                f.write_str("UNIQUE")?;
                if !columns.is_empty() {
                    f.write_str(" (")?;
                    ident_list(f, columns)?;
                    f.write_str(")")?;
                }
                Ok(())
            }
            ConstraintKind::NotNull => f.write_str("NOT NULL"),
            ConstraintKind::Check { expr } => write!(f, "CHECK ({expr})"),
            ConstraintKind::Default { expr } => write!(f, "DEFAULT {expr}"),
            ConstraintKind::Generated { expr } => {
                write!(f, "GENERATED ALWAYS AS ({expr}) STORED")
            }
        }
    }
}

impl fmt::Display for AlterTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TABLE {} ", self.name)?;
        match &self.action {
            AlterTableAction::RenameTable { name } => write!(f, "RENAME TO {name}"),
            AlterTableAction::RenameColumn { src, dst } => {
                write!(f, "RENAME COLUMN {src} TO {dst}")
            }
            AlterTableAction::RenameConstraint { src, dst } => {
                write!(f, "RENAME CONSTRAINT {src} TO {dst}")
            }
            AlterTableAction::AddColumn { def, not_exists } => {
                f.write_str("ADD COLUMN ")?;
                if *not_exists {
                    f.write_str("IF NOT EXISTS ")?;
                }
                write!(f, "{def}")
            }
            AlterTableAction::DropColumn { name, exists } => {
                f.write_str("DROP COLUMN ")?;
                if *exists {
                    f.write_str("IF EXISTS ")?;
                }
                f.write_str(name)
            }
            AlterTableAction::AddConstraint { constraint } => {
                write!(f, "ADD CONSTRAINT {constraint}")
            }
            AlterTableAction::DropConstraint { name, exists } => {
                f.write_str("DROP CONSTRAINT ")?;
                if *exists {
                    f.write_str("IF EXISTS ")?;
                }
                f.write_str(name)
            }
        }
    }
}

impl fmt::Display for CreateViewStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE ")?;
        if self.temp {
            f.write_str("TEMPORARY ")?;
        }
        write!(f, "VIEW {}", self.name)?;
        if !self.columns.is_empty() {
            f.write_str(" (")?;
            ident_list(f, &self.columns)?;
            f.write_str(")")?;
        }
        write!(f, " AS {}", self.body)
    }
}

impl fmt::Display for CreateProcedureStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.replace {
            f.write_str("CREATE OR REPLACE PROCEDURE ")?;
        } else {
            f.write_str("CREATE PROCEDURE ")?;
        }
        write!(f, "{}(", self.name)?;
        comma_list(f, &self.parameters)?;
        f.write_str(")")?;
        if let Some(language) = &self.language {
            write!(f, " LANGUAGE {language}")?;
        }
        if let Some(deterministic) = self.deterministic {
            if deterministic {
                f.write_str(" DETERMINISTIC")?;
            } else {
                f.write_str(" NOT DETERMINISTIC")?;
            }
        }
        match self.data_access {
            Some(DataAccess::ModifiesSql) => f.write_str(" MODIFIES SQL DATA")?,
            Some(DataAccess::ReadsSql) => f.write_str(" READS SQL DATA")?,
            Some(DataAccess::ContainsSql) => f.write_str(" CONTAINS SQL")?,
            None => {}
        }
        if self.null_input {
            f.write_str(" CALLED ON NULL INPUT")?;
        }
        if !self.options.is_empty() {
            f.write_str(" SET OPTION ")?;
            comma_list(f, &self.options)?;
        }
        f.write_str(" BEGIN ")?;
        for stmt in &self.body {
            write!(f, "{stmt}; ")?;
        }
        f.write_str("END")
    }
}

impl fmt::Display for ProcedureParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ParamMode::In => f.write_str("IN ")?,
            ParamMode::Out => f.write_str("OUT ")?,
            ParamMode::InOut => f.write_str("INOUT ")?,
        }
        write!(f, "{} {}", self.name, self.ty)?;
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {default}")?;
        }
        Ok(())
    }
}

impl fmt::Display for IfStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF {} THEN ", self.cdt)?;
        for stmt in &self.csq {
            write!(f, "{stmt}; ")?;
        }
        if !self.alt.is_empty() {
            f.write_str("ELSE ")?;
            for stmt in &self.alt {
                write!(f, "{stmt}; ")?;
            }
        }
        f.write_str("END IF")
    }
}

impl fmt::Display for WhileStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WHILE {} DO ", self.cdt)?;
        for stmt in &self.body {
            write!(f, "{stmt}; ")?;
        }
        f.write_str("END WHILE")
    }
}

impl fmt::Display for DeclareStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DECLARE {} {}", self.ident, self.ty)?;
        if let Some(value) = &self.value {
            write!(f, " DEFAULT {value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CallStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CALL {}(", self.ident)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = self.names.get(i) {
                write!(f, "{name} -> ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ident)?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        comma_list(f, &self.args)?;
        f.write_str(")")?;
        if let Some(filter) = &self.filter {
            write!(f, " FILTER (WHERE {filter})")?;
        }
        if let Some(over) = &self.over {
            write!(f, " OVER {over}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CaseStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CASE")?;
        if let Some(cdt) = &self.cdt {
            write!(f, " {cdt}")?;
        }
        for when in &self.body {
            write!(f, " WHEN {} THEN {}", when.cdt, when.body)?;
        }
        if let Some(alt) = &self.alt {
            write!(f, " ELSE {alt}")?;
        }
        f.write_str(" END")
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.join_type, self.table)?;
        match self.cond.as_deref() {
            Some(Statement::List(columns)) => {
                f.write_str(" USING (")?;
                comma_list(f, columns)?;
                f.write_str(")")
            }
            Some(cond) => write!(f, " ON {cond}"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)?;
        if let Some(orient) = &self.orient {
            write!(f, " {orient}")?;
        }
        if let Some(nulls) = &self.nulls {
            write!(f, " NULLS {nulls}")?;
        }
        Ok(())
    }
}

impl fmt::Display for WindowDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ident) = &self.ident {
            if self.partitions.is_empty() && self.orders.is_empty() && self.frame.is_none() {
                return f.write_str(ident);
            }
            write!(f, "{ident} AS ")?;
        }
        f.write_str("(")?;
        let mut wrote = false;
        if !self.partitions.is_empty() {
            f.write_str("PARTITION BY ")?;
            comma_list(f, &self.partitions)?;
            wrote = true;
        }
        if !self.orders.is_empty() {
            if wrote {
                f.write_str(" ")?;
            }
            f.write_str("ORDER BY ")?;
            comma_list(f, &self.orders)?;
            wrote = true;
        }
        if let Some(frame) = &self.frame {
            if wrote {
                f.write_str(" ")?;
            }
            write!(f, "{frame}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for FrameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unit)?;
        match &self.end {
            Some(end) => write!(f, " BETWEEN {} AND {end}", self.start)?,
            None => write!(f, " {}", self.start)?,
        }
        if let Some(exclude) = &self.exclude {
            write!(f, " EXCLUDE {exclude}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameBound::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            FrameBound::UnboundedFollowing => f.write_str("UNBOUNDED FOLLOWING"),
            FrameBound::CurrentRow => f.write_str("CURRENT ROW"),
            FrameBound::Preceding(expr) => write!(f, "{expr} PRECEDING"),
            FrameBound::Following(expr) => write!(f, "{expr} FOLLOWING"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match (self.length, self.precision) {
            (Some(length), Some(precision)) => write!(f, "({length}, {precision})"),
            (Some(length), None) => write!(f, "({length})"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Statement {
        Statement::Name(Name::bare(s))
    }

    #[test]
    fn render_select() {
        let stmt = Statement::Select(SelectStatement {
            columns: vec![name("a"), name("b")],
            tables: vec![name("t")],
            where_clause: Some(Box::new(Statement::Binary(Binary {
                left: Box::new(name("a")),
                op: "=".into(),
                right: Box::new(Statement::Value(Value::new("1"))),
            }))),
            groups: vec![name("a")],
            limit: Some(Limit {
                count: Some(10),
                offset: Some(5),
            }),
            ..Default::default()
        });
        assert_eq!(
            stmt.to_string(),
            "SELECT a, b FROM t WHERE a = 1 GROUP BY a LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    fn render_join_with_on() {
        let join = Statement::Join(Join {
            join_type: "LEFT JOIN".into(),
            table: Box::new(name("b")),
            cond: Some(Box::new(Statement::Binary(Binary {
                left: Box::new(name("a.id")),
                op: "=".into(),
                right: Box::new(name("b.id")),
            }))),
        });
        assert_eq!(join.to_string(), "LEFT JOIN b ON a.id = b.id");
    }

    #[test]
    fn render_with_cte() {
        let cte = Statement::Cte(CteStatement {
            ident: "c".into(),
            columns: vec!["x".into()],
            materialized: Materialized::Unspecified,
            body: Box::new(Statement::Select(SelectStatement {
                columns: vec![name("a")],
                tables: vec![name("t")],
                ..Default::default()
            })),
        });
        let with = Statement::With(WithStatement {
            recursive: false,
            queries: vec![cte],
            body: Box::new(Statement::Select(SelectStatement {
                columns: vec![name("c.x")],
                tables: vec![name("c")],
                ..Default::default()
            })),
        });
        assert_eq!(
            with.to_string(),
            "WITH c (x) AS (SELECT a FROM t) SELECT c.x FROM c"
        );
    }

    #[test]
    fn render_case() {
        let stmt = Statement::Case(CaseStatement {
            cdt: None,
            body: vec![When {
                cdt: Box::new(name("a")),
                body: Box::new(Statement::Value(Value::new("1"))),
            }],
            alt: Some(Box::new(Statement::Value(Value::new("0")))),
        });
        assert_eq!(stmt.to_string(), "CASE WHEN a THEN 1 ELSE 0 END");
    }
}
