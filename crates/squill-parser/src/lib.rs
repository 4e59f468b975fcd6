//! Multi-dialect SQL scanner and parser.
//!
//! The pipeline: characters → [`Scanner`] (driven by a [`KeywordSet`]) →
//! tokens → [`Parser`] (keyword-dispatched statements, Pratt expressions,
//! macro frames) → `squill_ast::Statement` values. Dialects layer keyword
//! overlays and handler overrides on top; see [`dialect`].

pub mod dialect;
mod expr;
mod keywords;
mod macros;
mod parser;
mod scanner;
mod stmt;
mod token;

pub use keywords::{is_join, standard, KeywordSet, Match};
pub use parser::{
    parse_metrics_snapshot, reset_parse_metrics, InfixFn, ParseError, ParseMetricsSnapshot,
    Parser, Power, PrefixFn, StatementFn, MAX_PARSE_DEPTH,
};
pub use scanner::{is_letter, LexRule, Scanner, K_MAX};
pub use token::{Symbol, Token, TokenKind};

#[cfg(test)]
mod corpus_tests {
    use super::*;
    use squill_ast::Statement;

    fn parse_clean(sql: &str) -> Vec<Statement> {
        let mut parser = Parser::new(sql);
        let (stmts, errors) = parser.parse_all();
        assert!(errors.is_empty(), "unexpected errors: {errors:#?}");
        assert!(!stmts.is_empty(), "no statements parsed");
        stmts
    }

    const SELECT_SQL: &str = "\
select 1;\n\
select e.dept, count(e.id) as total from employees e group by e.dept;\n\
select distinct_name from t where x in (1, 2, 3) and y between 0 and 9;\n\
select a, b from t1 inner join t2 on t1.id = t2.id left outer join t3 using (id);\n\
select name, case when salary >= 1000 then 'high' else 'low' end as band from employees;\n\
select count(*) filter (where active) over w, rank() over (partition by dept order by salary desc rows between unbounded preceding and current row) from employees window w as (partition by dept);\n\
select a from t order by a desc nulls last limit 10 offset 5;\n\
select a from t union all select a from u;\n\
select cast(total as decimal(10, 2)), price * 1.2, 'it''s', :name, $1, ? from orders;\n\
select sub.a from (select a from t where k = 1) sub where exists (select 1 from u where u.a = sub.a);\n\
select x from t where v = all (select v from u) or v < any (select v from w);\n\
select row(a, b), amount collate fr_fr from t where note like 'x%' and note not in (select note from banned);";

    const DELETE_SQL: &str = "\
delete from sessions where expires_at < now();\n\
delete from logs where level = 'debug' returning id;";

    const UPDATE_SQL: &str = "\
update employees set salary = salary * 1.1 where dept = 'eng';\n\
update t set (a, b) = (1, 2), c = 3 from u where t.id = u.id returning *;";

    const MERGE_SQL: &str = "\
merge into target t using source s on t.id = s.id when matched and s.deleted then delete when matched then update set t.v = s.v when not matched then insert (id, v) values (s.id, s.v);";

    const INSERT_SQL: &str = "\
insert into t (a, b) values (1, 'x'), (2, 'y');\n\
insert into t select a, b from u where b is not null;\n\
insert into t (a) values (1) on conflict (a) do update set b = 2 where t.a > 0 returning a;\n\
insert into t (a) values (1) on conflict do nothing;";

    const TRANSACTIONS_SQL: &str = "\
start transaction read write, isolation level repeatable read;\n\
savepoint before_update;\n\
update accounts set balance = balance - 10 where id = 1;\n\
release savepoint before_update;\n\
rollback to savepoint before_update;\n\
set transaction read only;\n\
commit;\n\
rollback;";

    const SCRIPT_SQL: &str = "\
declare total int default 0;\n\
set total = total + 1;\n\
if total > 10 then select 'big'; elsif total > 5 then select 'medium'; else select 'small'; end if;\n\
while total > 0 do set total = total - 1; end while;\n\
begin select 1; select 2; end;\n\
return total;\n\
case when total = 0 then select 'done'; else select 'pending'; end;";

    const CALL_SQL: &str = "\
call cleanup();\n\
call reschedule(42, 'daily');\n\
call notify(user -> 'root', level -> 2);";

    const TABLES_SQL: &str = "\
create table if not exists employees (id int primary key, name varchar(255) not null, dept_id int references departments(id), salary decimal(10, 2) default 0, check (salary >= 0));\n\
create temp table scratch (k int, v text, constraint pk_scratch primary key (k), foreign key (k) references t(k), unique (v));\n\
create table derived (total int generated always as (a + b) stored);\n\
alter table employees rename to staff;\n\
alter table staff rename column name to full_name;\n\
alter table staff add column if not exists badge int;\n\
alter table staff drop column if exists badge;\n\
alter table staff add constraint ck_salary check (salary >= 0);\n\
alter table staff drop constraint if exists ck_salary;\n\
drop table if exists scratch;\n\
create view active_staff (id, full_name) as select id, full_name from staff where active;\n\
drop view if exists active_staff;\n\
truncate table audit_log restart identity cascade;";

    const PROCEDURES_SQL: &str = "\
create procedure bump(in who varchar(64), inout amount int default 1) language sql begin update balances set total = total + amount where name = who; end;\n\
create or replace procedure reset_all() begin delete from balances; return; end;";

    const PERMS_SQL: &str = "\
grant select, insert on payroll to hr_app, auditors;\n\
grant all privileges on payroll to dba;\n\
revoke update on payroll from hr_app;";

    const WITH_SQL: &str = "\
with recent (id, seen) as (select id, max(seen) from events group by id) select r.id from recent r;\n\
with recursive walk as (select id, parent from nodes where parent is null union all select n.id, n.parent from nodes n) select id from walk;";

    #[test]
    fn corpus_select() {
        assert_eq!(parse_clean(SELECT_SQL).len(), 12);
    }

    #[test]
    fn corpus_delete() {
        assert_eq!(parse_clean(DELETE_SQL).len(), 2);
    }

    #[test]
    fn corpus_update() {
        assert_eq!(parse_clean(UPDATE_SQL).len(), 2);
    }

    #[test]
    fn corpus_merge() {
        assert_eq!(parse_clean(MERGE_SQL).len(), 1);
    }

    #[test]
    fn corpus_insert() {
        assert_eq!(parse_clean(INSERT_SQL).len(), 4);
    }

    #[test]
    fn corpus_transactions() {
        assert_eq!(parse_clean(TRANSACTIONS_SQL).len(), 8);
    }

    #[test]
    fn corpus_script() {
        assert_eq!(parse_clean(SCRIPT_SQL).len(), 7);
    }

    #[test]
    fn corpus_call() {
        assert_eq!(parse_clean(CALL_SQL).len(), 3);
    }

    #[test]
    fn corpus_tables() {
        assert_eq!(parse_clean(TABLES_SQL).len(), 13);
    }

    #[test]
    fn corpus_procedures() {
        assert_eq!(parse_clean(PROCEDURES_SQL).len(), 2);
    }

    #[test]
    fn corpus_perms() {
        assert_eq!(parse_clean(PERMS_SQL).len(), 3);
    }

    #[test]
    fn corpus_with() {
        let stmts = parse_clean(WITH_SQL);
        assert_eq!(stmts.len(), 2);
        for stmt in &stmts {
            match stmt.unwrap() {
                Statement::With(with) => {
                    assert!(!with.queries.is_empty());
                    assert!(with
                        .queries
                        .iter()
                        .all(|q| matches!(q, Statement::Cte(_))));
                }
                other => panic!("expected WITH, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_comma_in_projection_is_an_error() {
        let mut parser = Parser::new(
            "select e.dept count(e.id) from employees e \
             where e.salary >= 1000 and e.manager is null group by e.dept;",
        );
        let (_, errors) = parser.parse_all();
        assert_eq!(errors.len(), 1, "exactly one syntax error expected");
    }

    #[test]
    fn select_one_has_expected_shape() {
        let stmts = parse_clean("SELECT 1;");
        match &stmts[0] {
            Statement::Select(select) => {
                assert_eq!(select.columns.len(), 1);
                assert!(select.tables.is_empty());
                assert!(matches!(
                    &select.columns[0],
                    Statement::Value(v) if v.literal == "1"
                ));
            }
            other => panic!("expected select, got {other:?}"),
        }
    }

    #[test]
    fn comments_attach_to_statements() {
        let stmts = parse_clean("-- who is active\nselect a from t; -- trailing\nselect b from u;");
        match &stmts[0] {
            Statement::Commented(c) => {
                assert_eq!(c.before, vec!["who is active".to_string()]);
                assert_eq!(c.after.as_deref(), Some("trailing"));
                assert!(matches!(*c.inner, Statement::Select(_)));
            }
            other => panic!("expected commented statement, got {other:?}"),
        }
        assert!(matches!(&stmts[1], Statement::Select(_)));
    }

    #[test]
    fn canonical_rendering_reparses() {
        let sources = [
            "select a, b from t where x = 1 and y < 2 group by a having count(b) > 1;",
            "select * from a join b on a.id = b.id and b.k = 1;",
            "with c as (select a from t) select c.a from c;",
            "insert into t (a, b) values (1, 2);",
            "delete from t where a between 1 and 10;",
            "update t set a = a + 1 where b is null;",
        ];
        for source in sources {
            let first = parse_clean(source);
            let rendered = format!("{};", first[0]);
            let second = parse_clean(&rendered);
            assert_eq!(first[0], second[0], "round-trip failed for {source}");
        }
    }
}

#[cfg(test)]
mod proptest_roundtrip {
    use super::*;
    use proptest::prelude::*;

    fn keyword_set() -> KeywordSet {
        let mut set = standard();
        set.prepare();
        set
    }

    fn arb_ident() -> BoxedStrategy<String> {
        prop::string::string_regex("[a-z][a-z0-9_]{0,6}")
            .expect("valid regex")
            .prop_filter("must not be a keyword", |s| {
                let set = keyword_set();
                !set.is(&[s.as_str()]).2
            })
            .boxed()
    }

    fn arb_expr(depth: u32) -> BoxedStrategy<String> {
        if depth == 0 {
            prop_oneof![
                arb_ident(),
                any::<u32>().prop_map(|n| n.to_string()),
                Just("NULL".to_string()),
            ]
            .boxed()
        } else {
            prop_oneof![
                2 => arb_expr(depth - 1),
                2 => (arb_expr(depth - 1), arb_expr(depth - 1))
                    .prop_map(|(a, b)| format!("{a} + {b}")),
                2 => (arb_expr(depth - 1), arb_expr(depth - 1))
                    .prop_map(|(a, b)| format!("{a} = {b}")),
                1 => (arb_expr(depth - 1), arb_expr(depth - 1), arb_expr(depth - 1))
                    .prop_map(|(a, b, c)| format!("{a} between {b} and {c}")),
                1 => (arb_ident(), proptest::collection::vec(arb_expr(0), 1..4))
                    .prop_map(|(name, args)| format!("{name}({})", args.join(", "))),
                1 => arb_expr(depth - 1).prop_map(|e| format!("({e})")),
            ]
            .boxed()
        }
    }

    proptest! {
        #[test]
        fn generated_selects_parse_and_rerender_stably(
            cols in proptest::collection::vec(arb_expr(2), 1..4),
            table in arb_ident(),
            pred in arb_expr(2),
        ) {
            let sql = format!("select {} from {table} where {pred};", cols.join(", "));
            let mut parser = Parser::new(sql.as_str());
            let (stmts, errors) = parser.parse_all();
            prop_assert!(errors.is_empty(), "errors for {}: {:?}", sql, errors);
            prop_assert_eq!(stmts.len(), 1);

            // Rendering and reparsing must reach a fixed point.
            let rendered = format!("{};", stmts[0]);
            let mut reparser = Parser::new(rendered.as_str());
            let (restmts, reerrors) = reparser.parse_all();
            prop_assert!(reerrors.is_empty(), "reparse errors for {}", rendered);
            prop_assert_eq!(&stmts[0], &restmts[0]);
        }

        #[test]
        fn keyword_probe_never_panics(words in proptest::collection::vec("[a-z]{1,10}", 1..6)) {
            let set = keyword_set();
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let _ = set.is(&refs);
        }
    }
}
