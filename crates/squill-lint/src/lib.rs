//! Structural SQL linter.
//!
//! Rules walk the AST; they never halt processing and they see every nested
//! `SELECT` — compound branches, CTE bodies, join subqueries, scalar
//! subqueries in projections. Diagnostics come back in source order.

use std::fmt;

use squill_ast::{names_from, SelectStatement, Statement};
use squill_config::{Config, Value};

/// Diagnostic severity, mildest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
        }
    }
}

/// One linter finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintMessage {
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LintMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.rule, self.severity, self.message)
    }
}

/// Rule identifiers, as printed and as recognised in configuration.
pub const RULE_EXPR_UNQUALIFIED: &str = "expr-unqualified";
pub const RULE_EXPR_NOT_IN_GROUP_BY: &str = "expr-not-in-group-by";
pub const RULE_AGGREGATE_EXPECTED: &str = "aggregate-expected";
pub const RULE_INCONSISTENT_AS: &str = "inconsistent-as";
pub const RULE_INCONSISTENT_ORDER: &str = "inconsistent-order";
pub const RULE_SUBQUERY_TOO_MANY: &str = "subquery-too-many-results";

type RuleFn = fn(&SelectStatement) -> Vec<LintMessage>;

struct RuleEntry {
    name: &'static str,
    enabled: bool,
    run: RuleFn,
}

/// A rule's listing entry, for `lint -list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintInfo {
    pub rule: &'static str,
    pub enabled: bool,
}

/// The linter: an ordered set of toggleable rules.
pub struct Linter {
    rules: Vec<RuleEntry>,
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}

impl Linter {
    /// A linter with every rule enabled.
    #[must_use]
    pub fn new() -> Self {
        let entry = |name, run| RuleEntry {
            name,
            enabled: true,
            run,
        };
        Self {
            rules: vec![
                entry(RULE_EXPR_UNQUALIFIED, check_unqualified as RuleFn),
                entry(RULE_EXPR_NOT_IN_GROUP_BY, check_group_by),
                entry(RULE_INCONSISTENT_AS, check_as_usage),
                entry(RULE_INCONSISTENT_ORDER, check_order_usage),
                entry(RULE_SUBQUERY_TOO_MANY, check_result_subquery),
            ],
        }
    }

    /// Apply rule toggles from configuration. Boolean entries switch a rule
    /// on or off; `{level, priority}` sub-configs currently only imply the
    /// rule is on. Underscores in configured names match hyphens.
    pub fn apply_config(&mut self, config: &Config) {
        for (key, value) in config.iter() {
            let name = key.replace('_', "-");
            let Some(rule) = self.rules.iter_mut().find(|r| r.name == name) else {
                continue;
            };
            match value {
                Value::Bool(enabled) => rule.enabled = *enabled,
                Value::Map(_) => rule.enabled = true,
                _ => {}
            }
        }
    }

    /// Toggle one rule by name; unknown names report `false`.
    pub fn toggle(&mut self, name: &str, enabled: bool) -> bool {
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// The rules and their current state, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> Vec<LintInfo> {
        self.rules
            .iter()
            .map(|r| LintInfo {
                rule: r.name,
                enabled: r.enabled,
            })
            .collect()
    }

    /// Lint a batch of statements, producing diagnostics in source order.
    #[must_use]
    pub fn lint(&self, stmts: &[Statement]) -> Vec<LintMessage> {
        let mut messages = Vec::new();
        for stmt in stmts {
            self.lint_statement(stmt, &mut messages);
        }
        tracing::debug!(
            target: "squill.lint",
            statements = stmts.len(),
            diagnostics = messages.len(),
            "lint batch"
        );
        messages
    }

    fn lint_statement(&self, stmt: &Statement, out: &mut Vec<LintMessage>) {
        for_each_select(stmt, &mut |select| {
            for rule in &self.rules {
                if rule.enabled {
                    out.extend((rule.run)(select));
                }
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Select traversal
// ---------------------------------------------------------------------------

/// Visit every `SELECT` in the tree in source order, including compound
/// branches, CTE bodies, join subqueries and scalar subqueries.
fn for_each_select(stmt: &Statement, f: &mut impl FnMut(&SelectStatement)) {
    match stmt.unwrap() {
        Statement::Select(select) => {
            f(select);
            for column in &select.columns {
                for_each_select(column, f);
            }
            for table in &select.tables {
                for_each_select(table, f);
            }
            if let Some(where_clause) = &select.where_clause {
                for_each_select(where_clause, f);
            }
            if let Some(having) = &select.having {
                for_each_select(having, f);
            }
        }
        Statement::Union(c) | Statement::Intersect(c) | Statement::Except(c) => {
            for_each_select(&c.left, f);
            for_each_select(&c.right, f);
        }
        Statement::With(with) => {
            for query in &with.queries {
                for_each_select(query, f);
            }
            for_each_select(&with.body, f);
        }
        Statement::Cte(cte) => for_each_select(&cte.body, f),
        Statement::Join(join) => {
            for_each_select(&join.table, f);
            if let Some(cond) = &join.cond {
                for_each_select(cond, f);
            }
        }
        Statement::Group(inner)
        | Statement::Not(inner)
        | Statement::Exists(inner)
        | Statement::All(inner)
        | Statement::Any(inner) => for_each_select(inner, f),
        Statement::Alias(alias) => for_each_select(&alias.inner, f),
        Statement::Binary(binary) => {
            for_each_select(&binary.left, f);
            for_each_select(&binary.right, f);
        }
        Statement::In(in_expr) => {
            for_each_select(&in_expr.ident, f);
            for_each_select(&in_expr.value, f);
        }
        Statement::Insert(insert) => for_each_select(&insert.source, f),
        Statement::Update(update) => {
            if let Some(where_clause) = &update.where_clause {
                for_each_select(where_clause, f);
            }
        }
        Statement::Delete(delete) => {
            if let Some(where_clause) = &delete.where_clause {
                for_each_select(where_clause, f);
            }
        }
        Statement::CreateView(view) => for_each_select(&view.body, f),
        Statement::List(values) | Statement::Row(values) | Statement::Values(values) => {
            for value in values {
                for_each_select(value, f);
            }
        }
        Statement::Case(case) => {
            for when in &case.body {
                for_each_select(&when.cdt, f);
                for_each_select(&when.body, f);
            }
            if let Some(alt) = &case.alt {
                for_each_select(alt, f);
            }
        }
        Statement::Begin(body) => {
            for inner in body {
                for_each_select(inner, f);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// In a multi-table select, bare column references are ambiguous. Joined
/// tables count the same as comma-listed ones.
fn check_unqualified(select: &SelectStatement) -> Vec<LintMessage> {
    if select.tables.len() < 2 {
        return Vec::new();
    }
    let mut messages = Vec::new();
    for column in &select.columns {
        let column = match column.unwrap() {
            Statement::Alias(a) => a.inner.unwrap(),
            other => other,
        };
        if let Statement::Name(name) = column {
            if name.parts.len() == 1 && name.name() != "*" {
                messages.push(LintMessage {
                    rule: RULE_EXPR_UNQUALIFIED,
                    severity: Severity::Error,
                    message: format!("{}: expr is not qualified", name.ident()),
                });
            }
        }
    }
    messages
}

/// Projection columns must either appear in `GROUP BY` or be aggregated.
fn check_group_by(select: &SelectStatement) -> Vec<LintMessage> {
    if select.groups.is_empty() {
        return Vec::new();
    }
    let groups = names_from(&select.groups);
    let mut messages = Vec::new();
    for column in &select.columns {
        let column = match column.unwrap() {
            Statement::Alias(a) => a.inner.unwrap(),
            other => other,
        };
        match column {
            Statement::Value(_) => {}
            Statement::Name(name) => {
                if !groups.contains(&name.ident()) {
                    messages.push(LintMessage {
                        rule: RULE_EXPR_NOT_IN_GROUP_BY,
                        severity: Severity::Error,
                        message: format!("{}: expression should be in group by", name.ident()),
                    });
                }
            }
            Statement::FunctionCall(call) => {
                if !call.is_aggregate() {
                    messages.push(LintMessage {
                        rule: RULE_AGGREGATE_EXPECTED,
                        severity: Severity::Error,
                        message: format!("{}: not an aggregate function", call.ident_name()),
                    });
                }
            }
            _ => {}
        }
    }
    messages
}

/// `AS` should be used on all aliases of a clause or on none.
fn check_as_usage(select: &SelectStatement) -> Vec<LintMessage> {
    fn inconsistent(stmts: &[Statement]) -> bool {
        let mut with_as = 0usize;
        let mut without = 0usize;
        for stmt in stmts {
            let stmt = match stmt.unwrap() {
                Statement::Join(join) => join.table.unwrap(),
                other => other,
            };
            if let Statement::Alias(alias) = stmt {
                if alias.uses_as {
                    with_as += 1;
                } else {
                    without += 1;
                }
            }
        }
        with_as > 0 && without > 0
    }

    let mut messages = Vec::new();
    if inconsistent(&select.columns) {
        messages.push(LintMessage {
            rule: RULE_INCONSISTENT_AS,
            severity: Severity::Warning,
            message: "select: inconsistent use of AS".into(),
        });
    }
    if inconsistent(&select.tables) {
        messages.push(LintMessage {
            rule: RULE_INCONSISTENT_AS,
            severity: Severity::Warning,
            message: "from: inconsistent use of AS".into(),
        });
    }
    messages
}

/// Mixing explicit directions with defaulted ones in one `ORDER BY`.
fn check_order_usage(select: &SelectStatement) -> Vec<LintMessage> {
    let mut explicit = 0usize;
    let mut defaulted = 0usize;
    for order in &select.orders {
        if let Statement::Order(order) = order.unwrap() {
            if order.orient.is_some() {
                explicit += 1;
            } else {
                defaulted += 1;
            }
        }
    }
    if explicit > 0 && defaulted > 0 {
        return vec![LintMessage {
            rule: RULE_INCONSISTENT_ORDER,
            severity: Severity::Warning,
            message: "inconsistent use of ASC/DESC".into(),
        }];
    }
    Vec::new()
}

/// A subquery in a scalar position must produce exactly one column.
fn check_result_subquery(select: &SelectStatement) -> Vec<LintMessage> {
    let mut messages = Vec::new();
    for column in &select.columns {
        let column = match column.unwrap() {
            Statement::Alias(a) => a.inner.unwrap(),
            other => other,
        };
        let subquery = match column {
            Statement::Group(inner) => inner.unwrap(),
            Statement::Select(_) => column,
            _ => continue,
        };
        if let Statement::Select(inner) = subquery {
            if inner.columns.len() != 1 {
                messages.push(LintMessage {
                    rule: RULE_SUBQUERY_TOO_MANY,
                    severity: Severity::Error,
                    message: "too many result returned by subquery".into(),
                });
            }
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use squill_parser::Parser;

    fn lint(sql: &str) -> Vec<LintMessage> {
        let mut parser = Parser::new(sql);
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "{errors:?}");
        Linter::new().lint(&stmts)
    }

    fn rules_of(messages: &[LintMessage]) -> Vec<&'static str> {
        messages.iter().map(|m| m.rule).collect()
    }

    #[test]
    fn group_by_flags_stray_column() {
        let messages = lint("SELECT a, b FROM t GROUP BY a;");
        assert_eq!(rules_of(&messages), vec![RULE_EXPR_NOT_IN_GROUP_BY]);
        assert!(messages[0].message.contains('b'));
    }

    #[test]
    fn group_by_accepts_aggregates() {
        let messages = lint("SELECT a, MAX(b) FROM t GROUP BY a;");
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn group_by_flags_non_aggregate_call() {
        let messages = lint("SELECT a, substr(b, 1) FROM t GROUP BY a;");
        assert_eq!(rules_of(&messages), vec![RULE_AGGREGATE_EXPECTED]);
    }

    #[test]
    fn scalar_subquery_with_two_columns() {
        let messages = lint("SELECT (SELECT x, y FROM t) FROM u;");
        assert_eq!(rules_of(&messages), vec![RULE_SUBQUERY_TOO_MANY]);
    }

    #[test]
    fn scalar_subquery_with_one_column_is_fine() {
        let messages = lint("SELECT (SELECT x FROM t) FROM u;");
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn mixed_as_usage_in_projection() {
        let messages = lint("SELECT a x, b AS y FROM t;");
        assert_eq!(rules_of(&messages), vec![RULE_INCONSISTENT_AS]);
    }

    #[test]
    fn consistent_as_usage_is_fine() {
        assert!(lint("SELECT a AS x, b AS y FROM t;").is_empty());
        assert!(lint("SELECT a x, b y FROM t;").is_empty());
    }

    #[test]
    fn unqualified_column_in_multi_table_select() {
        let messages = lint("SELECT a, t1.b FROM t1, t2;");
        assert_eq!(rules_of(&messages), vec![RULE_EXPR_UNQUALIFIED]);
        assert!(messages[0].message.starts_with("a:"));
    }

    #[test]
    fn single_table_select_needs_no_qualification() {
        assert!(lint("SELECT a FROM t;").is_empty());
    }

    #[test]
    fn mixed_order_directions() {
        let messages = lint("SELECT a FROM t ORDER BY a DESC, b;");
        assert_eq!(rules_of(&messages), vec![RULE_INCONSISTENT_ORDER]);
        assert!(lint("SELECT a FROM t ORDER BY a DESC, b ASC;").is_empty());
    }

    #[test]
    fn nested_selects_are_checked() {
        // The stray group-by column hides inside a CTE body.
        let messages =
            lint("WITH c AS (SELECT a, b FROM t GROUP BY a) SELECT c.a FROM c;");
        assert_eq!(rules_of(&messages), vec![RULE_EXPR_NOT_IN_GROUP_BY]);

        // And inside a compound branch.
        let messages =
            lint("SELECT a FROM t UNION SELECT (SELECT x, y FROM v) FROM u;");
        assert_eq!(rules_of(&messages), vec![RULE_SUBQUERY_TOO_MANY]);
    }

    #[test]
    fn diagnostics_come_in_source_order() {
        let messages = lint(
            "SELECT a, b FROM t GROUP BY a;\nSELECT (SELECT x, y FROM v) FROM u;",
        );
        assert_eq!(
            rules_of(&messages),
            vec![RULE_EXPR_NOT_IN_GROUP_BY, RULE_SUBQUERY_TOO_MANY]
        );
    }

    #[test]
    fn config_toggles_rules() {
        let mut config = Config::new();
        config.set("expr-not-in-group-by", Value::Bool(false));
        let mut linter = Linter::new();
        linter.apply_config(&config);

        let mut parser = Parser::new("SELECT a, b FROM t GROUP BY a;");
        let (stmts, _) = parser.parse_all();
        assert!(linter.lint(&stmts).is_empty());

        assert!(linter.toggle(RULE_EXPR_NOT_IN_GROUP_BY, true));
        assert!(!linter.lint(&stmts).is_empty());
        assert!(!linter.toggle("no-such-rule", true));
    }

    #[test]
    fn rule_listing_reflects_state() {
        let mut linter = Linter::new();
        linter.toggle(RULE_INCONSISTENT_AS, false);
        let rules = linter.rules();
        assert!(rules
            .iter()
            .any(|r| r.rule == RULE_INCONSISTENT_AS && !r.enabled));
        assert!(rules
            .iter()
            .any(|r| r.rule == RULE_SUBQUERY_TOO_MANY && r.enabled));
    }

    #[test]
    fn message_rendering() {
        let message = LintMessage {
            rule: RULE_INCONSISTENT_AS,
            severity: Severity::Warning,
            message: "select: inconsistent use of AS".into(),
        };
        assert_eq!(
            message.to_string(),
            "inconsistent-as (warning): select: inconsistent use of AS"
        );
    }
}
