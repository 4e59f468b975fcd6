//! AST-to-AST rewrites driven by a rule bit-set.
//!
//! Each rule is a targeted transform; unhandled node shapes pass through
//! unchanged. The rewriter consumes and returns owned trees, never mutating
//! behind the caller's back, and applying the same rule set twice yields the
//! same tree as applying it once.

use bitflags::bitflags;
use squill_ast::{
    names_from, projection_names, replace_expr, replace_op, split_where, split_where_literal,
    Alias, Binary, CteStatement, FunctionCall, In, Join, Name, SelectStatement, Statement,
    WithStatement,
};
use squill_config::Config;

bitflags! {
    /// The rewrite rules selected by configuration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RewriteRules: u32 {
        const SUBQUERY_TO_CTE   = 1 << 0;
        const CTE_TO_SUBQUERY   = 1 << 1;
        const MISSING_CTE_ALIAS = 1 << 2;
        const JOIN_AS_SUBQUERY  = 1 << 3;
        const JOIN_PREDICATE    = 1 << 4;
        const STD_OP            = 1 << 5;
        const STD_EXPR          = 1 << 6;
        const GROUP_BY_AGGR     = 1 << 7;
        const GROUP_BY_GROUP    = 1 << 8;
        const ALL               = 1 << 9;
    }
}

impl RewriteRules {
    /// Resolve configuration rule names; unknown names are returned for the
    /// caller to report.
    #[must_use]
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> (Self, Vec<String>) {
        let mut rules = Self::empty();
        let mut unknown = Vec::new();
        for name in names {
            match name.as_ref() {
                "use-cte" | "subquery-to-cte" => rules |= Self::SUBQUERY_TO_CTE,
                "use-subquery" | "cte-to-subquery" => rules |= Self::CTE_TO_SUBQUERY,
                "missing-cte-alias" => rules |= Self::MISSING_CTE_ALIAS,
                "join-subquery" | "join-as-subquery" => rules |= Self::JOIN_AS_SUBQUERY,
                "join-predicate" => rules |= Self::JOIN_PREDICATE,
                "std-op" => rules |= Self::STD_OP,
                "std-expr" => rules |= Self::STD_EXPR,
                "group-by-aggregate" => rules |= Self::GROUP_BY_AGGR,
                "group-by-group" => rules |= Self::GROUP_BY_GROUP,
                "all" => rules |= Self::ALL,
                other => unknown.push(other.to_string()),
            }
        }
        (rules, unknown)
    }

    /// Read the `rewrite` list from a configuration map.
    #[must_use]
    pub fn from_config(config: &Config) -> (Self, Vec<String>) {
        match config.list("rewrite") {
            Some(names) => Self::from_names(names),
            None => (Self::empty(), Vec::new()),
        }
    }

    fn keep_as_is(self) -> bool {
        self.is_empty()
    }

    fn has_all(self) -> bool {
        self.contains(Self::ALL)
    }

    fn std_op(self) -> bool {
        self.contains(Self::STD_OP) || self.has_all()
    }

    fn std_expr(self) -> bool {
        self.contains(Self::STD_EXPR) || self.has_all()
    }

    fn group_by(self) -> bool {
        self.intersects(Self::GROUP_BY_AGGR | Self::GROUP_BY_GROUP)
    }
}

/// The rewriter: a rule set applied over statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rewriter {
    rules: RewriteRules,
}

impl Rewriter {
    #[must_use]
    pub fn new(rules: RewriteRules) -> Self {
        Self { rules }
    }

    /// Rewrite one statement under the configured rules.
    #[must_use]
    pub fn rewrite(&self, stmt: Statement) -> Statement {
        if self.rules.keep_as_is() {
            return stmt;
        }
        tracing::debug!(target: "squill.rewrite", rules = ?self.rules, "rewrite statement");

        let stmt = if self.rules.contains(RewriteRules::SUBQUERY_TO_CTE) || self.rules.has_all() {
            self.replace_subquery_with_cte(stmt)
        } else if self.rules.contains(RewriteRules::CTE_TO_SUBQUERY) {
            self.replace_cte_with_subquery(stmt)
        } else {
            stmt
        };
        self.apply(stmt)
    }

    fn apply(&self, stmt: Statement) -> Statement {
        match stmt {
            Statement::Select(select) => Statement::Select(self.rewrite_select(select)),
            Statement::Update(mut update) => {
                update.where_clause = update.where_clause.map(|w| Box::new(self.apply(*w)));
                Statement::Update(update)
            }
            Statement::Delete(mut delete) => {
                delete.where_clause = delete.where_clause.map(|w| Box::new(self.apply(*w)));
                Statement::Delete(delete)
            }
            Statement::With(mut with) => {
                with.queries = with
                    .queries
                    .into_iter()
                    .map(|q| self.apply(q))
                    .collect();
                with.body = Box::new(self.apply(*with.body));
                Statement::With(with)
            }
            Statement::Cte(cte) => Statement::Cte(self.rewrite_cte(cte)),
            Statement::Union(mut c) => {
                c.left = Box::new(self.apply(*c.left));
                c.right = Box::new(self.apply(*c.right));
                Statement::Union(c)
            }
            Statement::Intersect(mut c) => {
                c.left = Box::new(self.apply(*c.left));
                c.right = Box::new(self.apply(*c.right));
                Statement::Intersect(c)
            }
            Statement::Except(mut c) => {
                c.left = Box::new(self.apply(*c.left));
                c.right = Box::new(self.apply(*c.right));
                Statement::Except(c)
            }
            Statement::Binary(binary) => self.rewrite_binary(binary),
            Statement::In(in_expr) => self.rewrite_in(in_expr, false),
            Statement::Not(inner) => self.rewrite_not(*inner),
            Statement::Group(inner) => Statement::Group(Box::new(self.apply(*inner))),
            Statement::Node(inner) => Statement::Node(Box::new(self.apply(*inner))),
            Statement::Commented(mut commented) => {
                commented.inner = Box::new(self.apply(*commented.inner));
                Statement::Commented(commented)
            }
            other => other,
        }
    }

    fn rewrite_select(&self, mut select: SelectStatement) -> SelectStatement {
        select.where_clause = select.where_clause.map(|w| Box::new(self.apply(*w)));
        select = self.rewrite_group_by(select);
        self.rewrite_joins(select)
    }

    /// Repair projections that disagree with `GROUP BY`: either extend the
    /// group list or wrap the stray column in `max(...)`.
    fn rewrite_group_by(&self, mut select: SelectStatement) -> SelectStatement {
        if select.groups.is_empty() || !self.rules.group_by() {
            return select;
        }
        let groups = names_from(&select.groups);
        let mut extra_groups = Vec::new();
        for column in &mut select.columns {
            let bare = match column.unwrap() {
                Statement::Alias(a) => a.inner.as_ref().clone(),
                other => other.clone(),
            };
            match bare {
                Statement::Name(ref name) => {
                    if groups.contains(&name.ident()) {
                        continue;
                    }
                    if self.rules.contains(RewriteRules::GROUP_BY_GROUP) {
                        extra_groups.push(bare.clone());
                    } else if self.rules.contains(RewriteRules::GROUP_BY_AGGR) {
                        *column = Statement::FunctionCall(FunctionCall {
                            ident: Box::new(Statement::Name(Name::bare("max"))),
                            distinct: false,
                            args: vec![bare.clone()],
                            filter: None,
                            over: None,
                        });
                    }
                }
                Statement::FunctionCall(_) => {}
                _ => {}
            }
        }
        select.groups.extend(extra_groups);
        select
    }

    fn rewrite_joins(&self, mut select: SelectStatement) -> SelectStatement {
        let columns = select.columns.clone();
        let mut extra_where = Vec::new();
        for table in &mut select.tables {
            let Statement::Join(join) = table else {
                continue;
            };
            if !join_needs_rewrite(join) {
                continue;
            }
            if self.rules.contains(RewriteRules::JOIN_AS_SUBQUERY) {
                let cloned = join.clone();
                *table = self.rewrite_join_as_subquery(cloned, &columns);
            } else if self.rules.contains(RewriteRules::JOIN_PREDICATE) || self.rules.has_all() {
                let Some(cond) = join.cond.take() else {
                    continue;
                };
                if let Some(literal_part) = split_where_literal(&cond) {
                    extra_where.push(literal_part);
                }
                join.cond = split_where(&cond).map(Box::new);
            }
        }
        for predicate in extra_where {
            select.where_clause = Some(Box::new(match select.where_clause.take() {
                Some(existing) => Statement::Binary(Binary {
                    left: existing,
                    op: "AND".into(),
                    right: Box::new(predicate),
                }),
                None => predicate,
            }));
        }
        select
    }

    /// `JOIN t ON ident-pred AND value-pred` becomes
    /// `JOIN (SELECT … FROM t WHERE value-pred) ON ident-pred`.
    fn rewrite_join_as_subquery(&self, mut join: Join, columns: &[Statement]) -> Statement {
        let (alias, table) = match *join.table {
            Statement::Alias(a) => (Some(a.alias), *a.inner),
            other => (None, other),
        };
        let Statement::Name(name) = table else {
            // Only plain table references can be pushed into a subquery.
            join.table = Box::new(match alias {
                Some(alias) => Statement::Alias(Alias {
                    inner: Box::new(table),
                    alias,
                    uses_as: false,
                }),
                None => table,
            });
            return Statement::Join(join);
        };

        let cond = join.cond.take();
        let mut inner = SelectStatement::default();
        inner.tables.push(Statement::Name(name));
        if let Some(cond) = &cond {
            inner.where_clause = split_where_literal(cond).map(Box::new);
            let prefix = alias.clone().unwrap_or_default();
            inner.columns = merge_columns(columns, &names_in(cond), &prefix);
        }
        join.cond = cond.as_deref().and_then(split_where).map(Box::new);

        let subquery = Statement::Group(Box::new(Statement::Select(inner)));
        join.table = Box::new(match alias {
            Some(alias) => Statement::Alias(Alias {
                inner: Box::new(subquery),
                alias,
                uses_as: false,
            }),
            None => subquery,
        });
        Statement::Join(join)
    }

    fn rewrite_cte(&self, mut cte: CteStatement) -> CteStatement {
        if cte.columns.is_empty()
            && (self.rules.contains(RewriteRules::MISSING_CTE_ALIAS) || self.rules.has_all())
        {
            cte.columns = projection_names(&cte.body);
        }
        cte.body = Box::new(self.apply(*cte.body));
        cte
    }

    fn rewrite_binary(&self, mut binary: Binary) -> Statement {
        if binary.is_relation() {
            binary.left = Box::new(self.apply(*binary.left));
            binary.right = Box::new(self.apply(*binary.right));
            return Statement::Binary(binary);
        }
        if self.rules.std_op() {
            binary = replace_op(binary);
        }
        if self.rules.std_expr() {
            return replace_expr(binary);
        }
        Statement::Binary(binary)
    }

    fn rewrite_in(&self, in_expr: In, negated: bool) -> Statement {
        let rewrap = |stmt: Statement| {
            if negated {
                Statement::Not(Box::new(stmt))
            } else {
                stmt
            }
        };
        if !self.rules.std_expr() {
            return rewrap(Statement::In(in_expr));
        }
        match *in_expr.value {
            Statement::List(mut values) if values.len() == 1 => {
                let op = if negated { "<>" } else { "=" };
                Statement::Binary(Binary {
                    left: in_expr.ident,
                    op: op.into(),
                    right: Box::new(values.remove(0)),
                })
            }
            value => rewrap(Statement::In(In {
                ident: in_expr.ident,
                value: Box::new(value),
            })),
        }
    }

    fn rewrite_not(&self, inner: Statement) -> Statement {
        match inner {
            Statement::In(in_expr) => self.rewrite_in(in_expr, true),
            other => Statement::Not(Box::new(self.apply(other))),
        }
    }

    // -- CTE lifting and inlining -------------------------------------------

    /// Lift inline subqueries joined in `FROM` clauses up to CTEs.
    fn replace_subquery_with_cte(&self, stmt: Statement) -> Statement {
        let (recursive, mut queries, body) = match stmt {
            Statement::With(with) => {
                let mut rewritten = Vec::new();
                let mut lifted = Vec::new();
                for query in with.queries {
                    match query {
                        Statement::Cte(mut cte) => {
                            if let Statement::Select(select) = *cte.body {
                                let (new_body, extra) = self.replace_subqueries(select);
                                cte.body = Box::new(new_body);
                                lifted.extend(extra);
                            }
                            rewritten.push(Statement::Cte(cte));
                        }
                        other => rewritten.push(other),
                    }
                }
                rewritten.extend(lifted);
                (with.recursive, rewritten, *with.body)
            }
            other => (false, Vec::new(), other),
        };

        let body = match body.into_unwrapped() {
            Statement::Select(select) => {
                let (new_body, extra) = self.replace_subqueries(select);
                queries.extend(extra);
                new_body
            }
            other => other,
        };
        if queries.is_empty() {
            return body;
        }
        Statement::With(WithStatement {
            recursive,
            queries,
            body: Box::new(body),
        })
    }

    fn replace_subqueries(&self, mut select: SelectStatement) -> (Statement, Vec<Statement>) {
        let mut ctes = Vec::new();
        for table in &mut select.tables {
            let Statement::Join(join) = table else {
                continue;
            };
            let (alias, inner) = match join.table.as_ref().clone() {
                Statement::Alias(a) => (Some(a.alias), *a.inner),
                other => (None, other),
            };
            let inner = match inner {
                Statement::Group(g) => *g,
                other => other,
            };
            let Statement::Select(subquery) = inner else {
                continue;
            };

            let (lifted, nested) = self.replace_subqueries(subquery);
            ctes.extend(nested.into_iter().map(|c| self.apply(c)));

            let mut ident = alias.clone().unwrap_or_default();
            if let Statement::Select(ref s) = lifted {
                if let Some(Statement::Name(n)) = s.tables.first().map(Statement::unwrap) {
                    ident = n.ident();
                }
            }
            let cte = CteStatement {
                ident: ident.clone(),
                columns: Vec::new(),
                materialized: squill_ast::Materialized::Unspecified,
                body: Box::new(lifted),
            };
            ctes.push(Statement::Cte(self.force_cte_columns(cte)));

            let name = Statement::Name(Name::bare(ident));
            join.table = Box::new(match &alias {
                Some(alias) => Statement::Alias(Alias {
                    inner: Box::new(name),
                    alias: alias.clone(),
                    uses_as: false,
                }),
                None => name,
            });
        }
        (Statement::Select(select), ctes)
    }

    /// [`Rewriter::rewrite_cte`] with the missing-alias rule forced on, as
    /// freshly lifted CTEs always need column names.
    fn force_cte_columns(&self, cte: CteStatement) -> CteStatement {
        let forced = Self {
            rules: self.rules | RewriteRules::MISSING_CTE_ALIAS,
        };
        forced.rewrite_cte(cte)
    }

    /// Inline every CTE whose name appears in the main query's tables.
    fn replace_cte_with_subquery(&self, stmt: Statement) -> Statement {
        let Statement::With(with) = stmt else {
            return stmt;
        };
        let mut ctes: Vec<CteStatement> = Vec::new();
        for query in &with.queries {
            if let Statement::Cte(cte) = query.unwrap() {
                ctes.push(cte.clone());
            }
        }
        // A CTE body may itself reference earlier CTEs.
        for i in 0..ctes.len() {
            if let Statement::Select(select) = (*ctes[i].body).clone() {
                let others: Vec<CteStatement> = ctes
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, c)| c.clone())
                    .collect();
                ctes[i].body = Box::new(replace_cte_refs(select, &others));
            }
        }
        match (*with.body).clone().into_unwrapped() {
            Statement::Select(select) => replace_cte_refs(select, &ctes),
            _ => Statement::With(with),
        }
    }
}

fn replace_cte_refs(mut select: SelectStatement, ctes: &[CteStatement]) -> Statement {
    // Inside an existing alias the body is substituted bare; a bare table
    // reference gains the CTE's name as its alias.
    fn subst(stmt: Statement, ctes: &[CteStatement]) -> Statement {
        match stmt {
            Statement::Node(inner) => Statement::Node(Box::new(subst(*inner, ctes))),
            Statement::Name(name) => match ctes.iter().find(|c| c.ident == name.ident()) {
                Some(cte) => Statement::Group(cte.body.clone()),
                None => Statement::Name(name),
            },
            other => other,
        }
    }
    fn replace(stmt: Statement, ctes: &[CteStatement]) -> Statement {
        match stmt {
            Statement::Node(inner) => Statement::Node(Box::new(replace(*inner, ctes))),
            Statement::Alias(mut alias) => {
                alias.inner = Box::new(subst(*alias.inner, ctes));
                Statement::Alias(alias)
            }
            Statement::Join(mut join) => {
                join.table = Box::new(replace(*join.table, ctes));
                Statement::Join(join)
            }
            Statement::Name(name) => {
                match ctes.iter().find(|c| c.ident == name.ident()) {
                    Some(cte) => Statement::Alias(Alias {
                        inner: Box::new(Statement::Group(cte.body.clone())),
                        alias: cte.ident.clone(),
                        uses_as: false,
                    }),
                    None => Statement::Name(name),
                }
            }
            Statement::Select(inner) => Statement::Group(Box::new(Statement::Select(inner))),
            other => other,
        }
    }
    for table in &mut select.tables {
        let replaced = replace(std::mem::replace(table, Statement::Commit), ctes);
        *table = replaced;
    }
    Statement::Select(select)
}

fn names_in(stmt: &Statement) -> Vec<Statement> {
    names_from(std::slice::from_ref(stmt))
        .into_iter()
        .map(|ident| {
            Statement::Name(Name {
                parts: ident.split('.').map(str::to_string).collect(),
            })
        })
        .collect()
}

fn merge_columns(set1: &[Statement], set2: &[Statement], prefix: &str) -> Vec<Statement> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::new();
    for stmt in set1.iter().chain(set2) {
        let Statement::Name(name) = stmt.unwrap() else {
            continue;
        };
        let ident = name.ident();
        if !ident.starts_with(prefix) || !seen.insert(ident) {
            continue;
        }
        merged.push(Statement::Name(name.clone()));
    }
    merged
}

fn join_needs_rewrite(join: &Join) -> bool {
    fn has_value(stmt: &Statement) -> bool {
        matches!(stmt.unwrap(), Statement::Value(_))
    }
    fn check(stmt: &Statement) -> bool {
        let Statement::Binary(binary) = stmt.unwrap() else {
            return false;
        };
        if binary.is_relation() {
            return check(&binary.left) || check(&binary.right);
        }
        has_value(&binary.left) || has_value(&binary.right)
    }
    join.cond.as_deref().is_some_and(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use squill_parser::Parser;

    fn parse_one(sql: &str) -> Statement {
        let mut parser = Parser::new(sql);
        let (mut stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(stmts.len(), 1);
        stmts.remove(0)
    }

    fn rewrite(sql: &str, rules: RewriteRules) -> Statement {
        Rewriter::new(rules).rewrite(parse_one(sql))
    }

    #[test]
    fn rule_names_resolve() {
        let (rules, unknown) =
            RewriteRules::from_names(&["use-cte", "std-op", "std-expr", "wat"]);
        assert!(rules.contains(RewriteRules::SUBQUERY_TO_CTE));
        assert!(rules.contains(RewriteRules::STD_OP));
        assert!(rules.contains(RewriteRules::STD_EXPR));
        assert_eq!(unknown, vec!["wat"]);
    }

    #[test]
    fn std_expr_collapses_singleton_in() {
        let stmt = rewrite(
            "select a from t where x in (1);",
            RewriteRules::STD_EXPR,
        );
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        let where_clause = select.where_clause.expect("where");
        match *where_clause {
            Statement::Binary(binary) => {
                assert_eq!(binary.op, "=");
                assert_eq!(binary.right.to_string(), "1");
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn std_expr_collapses_negated_singleton_in() {
        let stmt = rewrite(
            "select a from t where x not in (1);",
            RewriteRules::STD_EXPR,
        );
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert_eq!(select.where_clause.expect("where").to_string(), "x <> 1");
    }

    #[test]
    fn join_predicate_moves_literals_to_where() {
        let stmt = rewrite(
            "select * from a join b on a.id = b.id and b.k = 1;",
            RewriteRules::JOIN_PREDICATE,
        );
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        match &select.tables[1] {
            Statement::Join(join) => {
                assert_eq!(
                    join.cond.as_ref().expect("on").to_string(),
                    "a.id = b.id"
                );
            }
            other => panic!("expected join, got {other:?}"),
        }
        assert_eq!(
            select.where_clause.expect("where").to_string(),
            "b.k = 1"
        );
    }

    #[test]
    fn join_as_subquery_pushes_value_predicates_down() {
        let stmt = rewrite(
            "select b.v from a join b on a.id = b.id and b.k = 1;",
            RewriteRules::JOIN_AS_SUBQUERY,
        );
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        match &select.tables[1] {
            Statement::Join(join) => {
                let rendered = join.table.to_string();
                assert!(rendered.contains("SELECT"), "subquery expected: {rendered}");
                assert!(rendered.contains("WHERE b.k = 1"), "{rendered}");
                assert_eq!(join.cond.as_ref().expect("on").to_string(), "a.id = b.id");
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn missing_cte_alias_fills_columns() {
        let stmt = rewrite(
            "with c as (select a, b as total from t) select c.a from c;",
            RewriteRules::MISSING_CTE_ALIAS,
        );
        let Statement::With(with) = stmt else {
            panic!("expected with");
        };
        match &with.queries[0] {
            Statement::Cte(cte) => {
                assert_eq!(cte.columns, vec!["a".to_string(), "total".to_string()]);
            }
            other => panic!("expected cte, got {other:?}"),
        }
    }

    #[test]
    fn cte_to_subquery_inlines_the_body() {
        let stmt = rewrite(
            "with c as (select a from t) select c.a from c;",
            RewriteRules::CTE_TO_SUBQUERY,
        );
        assert_eq!(
            stmt.to_string(),
            "SELECT c.a FROM (SELECT a FROM t) c"
        );
    }

    #[test]
    fn subquery_to_cte_lifts_join_subqueries() {
        let stmt = rewrite(
            "select t.a, x.b from t join (select b from u) x on t.a = x.b;",
            RewriteRules::SUBQUERY_TO_CTE,
        );
        let Statement::With(with) = stmt else {
            panic!("expected with, got something else");
        };
        assert_eq!(with.queries.len(), 1);
        match &with.queries[0] {
            Statement::Cte(cte) => {
                assert_eq!(cte.ident, "u");
                assert_eq!(cte.columns, vec!["b".to_string()]);
            }
            other => panic!("expected cte, got {other:?}"),
        }
    }

    #[test]
    fn cte_round_trip_is_semantically_stable() {
        let source = "select t.a, x.b from t join (select b from u) x on t.a = x.b;";
        let original = parse_one(source);
        let lifted = Rewriter::new(RewriteRules::SUBQUERY_TO_CTE).rewrite(original.clone());
        let inlined = Rewriter::new(RewriteRules::CTE_TO_SUBQUERY).rewrite(lifted);
        assert_eq!(inlined.to_string(), original.to_string());
    }

    #[test]
    fn group_by_aggr_wraps_stray_columns() {
        let stmt = rewrite(
            "select a, b from t group by a;",
            RewriteRules::GROUP_BY_AGGR,
        );
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert_eq!(select.columns[1].to_string(), "max(b)");
    }

    #[test]
    fn group_by_group_extends_the_group_list() {
        let stmt = rewrite(
            "select a, b from t group by a;",
            RewriteRules::GROUP_BY_GROUP,
        );
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert_eq!(select.groups.len(), 2);
        assert_eq!(select.groups[1].to_string(), "b");
    }

    #[test]
    fn empty_rule_set_is_identity() {
        let source = "select a from t where x in (1) and y != 2;";
        let original = parse_one(source);
        let rewritten = Rewriter::new(RewriteRules::empty()).rewrite(original.clone());
        assert_eq!(original, rewritten);
    }

    #[test]
    fn rewrites_are_idempotent() {
        let sources = [
            "select a from t where x in (1);",
            "select * from a join b on a.id = b.id and b.k = 1;",
            "with c as (select a from t) select c.a from c;",
            "select a, b from t group by a;",
            "select t.a, x.b from t join (select b from u) x on t.a = x.b;",
        ];
        let rule_sets = [
            RewriteRules::STD_EXPR,
            RewriteRules::STD_OP,
            RewriteRules::JOIN_PREDICATE,
            RewriteRules::JOIN_AS_SUBQUERY,
            RewriteRules::MISSING_CTE_ALIAS,
            RewriteRules::CTE_TO_SUBQUERY,
            RewriteRules::SUBQUERY_TO_CTE,
            RewriteRules::GROUP_BY_AGGR,
            RewriteRules::GROUP_BY_GROUP,
            RewriteRules::ALL,
        ];
        for source in sources {
            for rules in rule_sets {
                let rewriter = Rewriter::new(rules);
                let once = rewriter.rewrite(parse_one(source));
                let twice = rewriter.rewrite(once.clone());
                assert_eq!(once, twice, "not idempotent: {source} under {rules:?}");
            }
        }
    }
}

#[cfg(test)]
mod proptest_idempotence {
    use super::*;
    use proptest::prelude::*;
    use squill_parser::Parser;

    fn arb_rules() -> BoxedStrategy<RewriteRules> {
        (0u32..(1 << 10))
            .prop_map(RewriteRules::from_bits_truncate)
            .boxed()
    }

    proptest! {
        #[test]
        fn any_rule_set_is_idempotent(rules in arb_rules()) {
            let sources = [
                "select a from t where x in (1) and y not in (2);",
                "select a, b from t1 join t2 on t1.a = t2.a and t2.flag = 1 group by a;",
                "with c as (select a from t) select c.a from c join (select b from u) x on c.a = x.b;",
            ];
            for source in sources {
                let mut parser = Parser::new(source);
                let (mut stmts, errors) = parser.parse_all();
                prop_assert!(errors.is_empty());
                let stmt = stmts.remove(0);
                let rewriter = Rewriter::new(rules);
                let once = rewriter.rewrite(stmt);
                let twice = rewriter.rewrite(once.clone());
                prop_assert_eq!(once, twice);
            }
        }
    }
}
