//! Traversal helpers shared by the rewriter and the linter.

use crate::{Binary, Statement};

/// Collect the dotted identifiers referenced by the given statements, walking
/// the expression shapes (`Binary`, `Unary`, `Not`, `In`, `Is`, calls, lists,
/// groups, aliases) that can carry names.
#[must_use]
pub fn names_from(stmts: &[Statement]) -> Vec<String> {
    let mut out = Vec::new();
    for stmt in stmts {
        collect_names(stmt, &mut out);
    }
    out
}

fn collect_names(stmt: &Statement, out: &mut Vec<String>) {
    match stmt {
        Statement::Name(n) => out.push(n.ident()),
        Statement::Alias(a) => collect_names(&a.inner, out),
        Statement::Binary(b) => {
            collect_names(&b.left, out);
            collect_names(&b.right, out);
        }
        Statement::Unary(u) => collect_names(&u.right, out),
        Statement::Not(inner) => collect_names(inner, out),
        Statement::In(i) => {
            collect_names(&i.ident, out);
            collect_names(&i.value, out);
        }
        Statement::Is(i) => collect_names(&i.ident, out),
        Statement::Between(b) => {
            collect_names(&b.ident, out);
            collect_names(&b.lower, out);
            collect_names(&b.upper, out);
        }
        Statement::FunctionCall(c) => {
            for arg in &c.args {
                collect_names(arg, out);
            }
        }
        Statement::List(values) | Statement::Row(values) => {
            for v in values {
                collect_names(v, out);
            }
        }
        Statement::Group(inner) | Statement::Node(inner) => collect_names(inner, out),
        Statement::Collate(c) => collect_names(&c.inner, out),
        Statement::Cast(c) => collect_names(&c.ident, out),
        Statement::Order(o) => collect_names(&o.inner, out),
        Statement::Commented(c) => collect_names(&c.inner, out),
        _ => {}
    }
}

/// The output column names a query produces: explicit aliases where present,
/// otherwise the bare column name. Used to populate missing CTE column lists.
#[must_use]
pub fn projection_names(stmt: &Statement) -> Vec<String> {
    match stmt.unwrap() {
        Statement::Select(s) => s
            .columns
            .iter()
            .filter_map(|c| match c.unwrap() {
                Statement::Alias(a) => Some(a.alias.clone()),
                Statement::Name(n) => Some(n.name()),
                Statement::FunctionCall(_) | Statement::Value(_) => None,
                _ => None,
            })
            .collect(),
        Statement::Union(c) | Statement::Intersect(c) | Statement::Except(c) => {
            projection_names(&c.left)
        }
        Statement::With(w) => projection_names(&w.body),
        Statement::Group(inner) => projection_names(inner),
        _ => Vec::new(),
    }
}

/// The aliases explicitly introduced in a projection list.
#[must_use]
pub fn get_aliases_from(columns: &[Statement]) -> Vec<String> {
    columns
        .iter()
        .filter_map(|c| match c.unwrap() {
            Statement::Alias(a) => Some(a.alias.clone()),
            _ => None,
        })
        .collect()
}

fn has_value_leaf(stmt: &Statement) -> bool {
    match stmt.unwrap() {
        Statement::Value(_) | Statement::Placeholder(_) => true,
        Statement::Group(inner) => has_value_leaf(inner),
        Statement::Binary(b) => has_value_leaf(&b.left) || has_value_leaf(&b.right),
        Statement::Unary(u) => has_value_leaf(&u.right),
        Statement::Not(inner) => has_value_leaf(inner),
        _ => false,
    }
}

fn split_chain(stmt: &Statement, keep: &dyn Fn(&Statement) -> bool) -> Option<Statement> {
    match stmt {
        Statement::Binary(b) if b.is_relation() => {
            let left = split_chain(&b.left, keep);
            let right = split_chain(&b.right, keep);
            match (left, right) {
                (Some(l), Some(r)) => Some(Statement::Binary(Binary {
                    left: Box::new(l),
                    op: b.op.clone(),
                    right: Box::new(r),
                })),
                (Some(s), None) | (None, Some(s)) => Some(s),
                (None, None) => None,
            }
        }
        Statement::Group(inner) | Statement::Node(inner) => split_chain(inner, keep),
        other => keep(other).then(|| other.clone()),
    }
}

/// From an `AND`/`OR` chain, keep only the relations whose leaves are both
/// identifiers (the join-key predicates).
#[must_use]
pub fn split_where(stmt: &Statement) -> Option<Statement> {
    split_chain(stmt, &|s| !has_value_leaf(s))
}

/// From an `AND`/`OR` chain, keep only the relations involving a literal
/// leaf (the value predicates a rewrite can push elsewhere).
#[must_use]
pub fn split_where_literal(stmt: &Statement) -> Option<Statement> {
    split_chain(stmt, &has_value_leaf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Alias, Name, Value};

    fn name(s: &str) -> Statement {
        Statement::Name(Name::bare(s))
    }

    fn value(s: &str) -> Statement {
        Statement::Value(Value::new(s))
    }

    fn binary(left: Statement, op: &str, right: Statement) -> Statement {
        Statement::Binary(Binary {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
        })
    }

    #[test]
    fn names_from_walks_binary_chains() {
        let expr = binary(
            binary(name("a.id"), "=", name("b.id")),
            "AND",
            binary(name("b.k"), "=", value("1")),
        );
        assert_eq!(names_from(&[expr]), vec!["a.id", "b.id", "b.k"]);
    }

    #[test]
    fn split_where_separates_literal_predicates() {
        // a.id = b.id AND b.k = 1
        let expr = binary(
            binary(name("a.id"), "=", name("b.id")),
            "AND",
            binary(name("b.k"), "=", value("1")),
        );

        let idents = split_where(&expr).expect("identifier side");
        assert_eq!(idents, binary(name("a.id"), "=", name("b.id")));

        let literals = split_where_literal(&expr).expect("literal side");
        assert_eq!(literals, binary(name("b.k"), "=", value("1")));
    }

    #[test]
    fn split_where_handles_all_literal_chain() {
        let expr = binary(name("k"), "=", value("1"));
        assert!(split_where(&expr).is_none());
        assert_eq!(split_where_literal(&expr), Some(expr));
    }

    #[test]
    fn projection_names_prefers_aliases() {
        let select = Statement::Select(crate::SelectStatement {
            columns: vec![
                Statement::Alias(Alias {
                    inner: Box::new(name("a")),
                    alias: "x".into(),
                    uses_as: true,
                }),
                name("t.b"),
            ],
            ..Default::default()
        });
        assert_eq!(projection_names(&select), vec!["x", "b"]);
    }
}
