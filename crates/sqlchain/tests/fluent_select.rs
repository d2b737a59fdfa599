mod common;

use common::MockExecutor;
use serde_json::json;
use sqlchain::{
    BuilderConfig, CompareOp, Condition, Dialect, FromRow, QbError, QbResult, QueryBuilder, Row,
    StructuralState, Value,
};

#[tokio::test]
async fn get_sends_one_statement_with_bindings() {
    let mock = MockExecutor::new();
    mock.respond(vec![Row::new().with("id", 1).with("name", "alice")]);

    let mut db = QueryBuilder::new(&mock);
    let rows = db
        .table("users")
        .where_(Condition::all_eq([("status", 1)]))
        .where_(("age", CompareOp::Gt, 18))
        .get()
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<String>("name").unwrap(), "alice");

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].sql,
        "SELECT * FROM `users` WHERE `status` = :p1 AND `age` > :p2"
    );
    let params = calls[0].bindings.to_map();
    assert_eq!(params["p1"], Value::Int(1));
    assert_eq!(params["p2"], Value::Int(18));
}

#[tokio::test]
async fn count_over_in_list() {
    let mock = MockExecutor::new();
    mock.respond(vec![Row::new().with("count_num", 2)]);

    let mut db = QueryBuilder::new(&mock);
    let n = db
        .table("orders")
        .where_in("status", ["paid", "shipped"])
        .count()
        .await
        .unwrap();

    assert_eq!(n, 2);
    assert_eq!(
        mock.last_sql(),
        "SELECT COUNT(*) AS count_num FROM `orders` WHERE `status` IN (:p1,:p2)"
    );
}

#[tokio::test]
async fn builder_resets_after_terminal() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);

    db.table("t1")
        .join("t3", "t3.id", "t1.t3_id")
        .where_(("a", 1))
        .get()
        .await
        .unwrap();
    assert!(db.bindings().is_empty());
    assert_eq!(db.state(), &StructuralState::default());

    db.table("t2").select(["*"]).get().await.unwrap();

    let calls = mock.calls();
    assert_eq!(calls[1].sql, "SELECT * FROM `t2`");
    assert!(calls[1].bindings.is_empty());
}

#[tokio::test]
async fn placeholders_restart_per_statement() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);

    db.table("a").where_(("x", 1)).where_(("y", 2)).get().await.unwrap();
    db.table("b").where_(("z", 3)).get().await.unwrap();

    assert_eq!(mock.last_sql(), "SELECT * FROM `b` WHERE `z` = :p1");
}

#[tokio::test]
async fn row_returns_first_or_none() {
    let mock = MockExecutor::new();
    mock.respond(vec![Row::new().with("id", 1), Row::new().with("id", 2)]);

    let mut db = QueryBuilder::new(&mock);
    let first = db.table("users").order_by_asc("id").row().await.unwrap();
    assert_eq!(first.unwrap().get::<i64>("id").unwrap(), 1);

    let none = db.table("users").where_(("id", 99)).row().await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn list_projects_one_column() {
    let mock = MockExecutor::new();
    mock.respond(vec![
        Row::new().with("col_list", "a@x.io"),
        Row::new().with("col_list", "b@x.io"),
    ]);

    let mut db = QueryBuilder::new(&mock);
    let emails = db
        .table("users")
        .select(["id", "name"])
        .where_(("active", true))
        .list("email")
        .await
        .unwrap();

    assert_eq!(
        emails,
        vec![Value::Text("a@x.io".into()), Value::Text("b@x.io".into())]
    );
    assert_eq!(
        mock.last_sql(),
        "SELECT `email` AS col_list FROM `users` WHERE `active` = :p1"
    );
}

#[tokio::test]
async fn aggregates_use_their_aliases() {
    let mock = MockExecutor::new();
    mock.respond(vec![Row::new().with("sum_num", 30)])
        .respond(vec![Row::new().with("max_num", 20)])
        .respond(vec![Row::new().with("min_num", 10)])
        .respond(vec![Row::new().with("avg_num", 15.0)])
        .respond(vec![Row::new().with("count_num", 3)]);

    let mut db = QueryBuilder::new(&mock);
    assert_eq!(db.table("orders").sum("total").await.unwrap(), Value::Int(30));
    assert_eq!(db.table("orders").max("total").await.unwrap(), Value::Int(20));
    assert_eq!(db.table("orders").min("total").await.unwrap(), Value::Int(10));
    assert_eq!(db.table("orders").avg("total").await.unwrap(), Value::Float(15.0));
    assert_eq!(db.table("orders").count_of("user_id").await.unwrap(), 3);

    let sql: Vec<String> = mock.calls().into_iter().map(|c| c.sql).collect();
    assert_eq!(
        sql,
        vec![
            "SELECT SUM(`total`) AS sum_num FROM `orders`",
            "SELECT MAX(`total`) AS max_num FROM `orders`",
            "SELECT MIN(`total`) AS min_num FROM `orders`",
            "SELECT AVG(`total`) AS avg_num FROM `orders`",
            "SELECT COUNT(`user_id`) AS count_num FROM `orders`",
        ]
    );
}

#[tokio::test]
async fn sum_over_no_rows_is_null() {
    let mock = MockExecutor::new();
    mock.respond(vec![Row::new().with("sum_num", Value::Null)]);

    let mut db = QueryBuilder::new(&mock);
    let total = db.table("orders").where_(("id", -1)).sum("total").await.unwrap();
    assert!(total.is_null());
}

#[tokio::test]
async fn aggregate_without_row_is_not_found() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);
    let err = db.table("orders").count().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn missing_table_is_validation_error() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);

    let err = db.where_(("a", 1)).get().await.unwrap_err();
    assert!(matches!(err, QbError::Validation(_)));
    assert!(err.is_builder_error());
    assert!(mock.calls().is_empty());

    // The rejected statement does not leak into the next one.
    db.table("users").get().await.unwrap();
    assert_eq!(mock.last_sql(), "SELECT * FROM `users`");
}

#[tokio::test]
async fn failing_executor_still_resets() {
    let mock = MockExecutor::new();
    mock.fail("relation \"nope\" does not exist");

    let mut db = QueryBuilder::new(&mock);
    let err = db.table("nope").where_(("a", 1)).get().await.unwrap_err();
    assert!(matches!(err, QbError::Execution(_)));
    assert!(!err.is_builder_error());

    assert_eq!(db.state(), &StructuralState::default());
    assert!(db.bindings().is_empty());
}

#[tokio::test]
async fn debug_dump_keeps_state_for_get() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);

    db.table("users").where_(("status", 1));
    let dump = db.debug_dump();
    db.get().await.unwrap();

    let calls = mock.calls();
    assert_eq!(calls[0].sql, dump.sql);
    assert_eq!(calls[0].bindings, dump.bindings);
}

#[tokio::test]
async fn subquery_bindings_reach_the_engine() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);

    db.table("users")
        .where_(("status", 1))
        .where_in_sub("id", |q| {
            q.table("orders")
                .select(["user_id"])
                .where_(("total", CompareOp::Gte, 100));
        })
        .where_brackets(|q| {
            q.where_(("role", "admin")).or_where(("role", "owner"));
        })
        .get()
        .await
        .unwrap();

    let call = &mock.calls()[0];
    assert_eq!(
        call.sql,
        "SELECT * FROM `users` WHERE `status` = :p1 AND `id` IN \
         (SELECT `user_id` FROM `orders` WHERE `total` >= :p2) \
         AND (`role` = :p3 OR `role` = :p4)"
    );
    assert_eq!(call.bindings.len(), 4);
}

#[tokio::test]
async fn dialect_follows_executor() {
    let mock = MockExecutor::postgres();
    let mut db = QueryBuilder::new(&mock);
    assert_eq!(db.dialect(), Dialect::Postgres);

    db.table("users")
        .where_(("users.id", 5))
        .or_where_between("age", 18, 30)
        .get()
        .await
        .unwrap();

    assert_eq!(
        mock.last_sql(),
        r#"SELECT * FROM "users" WHERE "users"."id" = $1 OR "age" BETWEEN $2 AND $3"#
    );
}

#[tokio::test]
async fn config_overrides_dialect() {
    let mock = MockExecutor::postgres();
    let config = BuilderConfig::new().dialect(Dialect::MySql).no_sql_log();
    let mut db = QueryBuilder::with_config(&mock, config);

    db.table("users").get().await.unwrap();
    assert_eq!(mock.last_sql(), "SELECT * FROM `users`");
}

#[tokio::test]
async fn raw_calls_bypass_builder_state() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);
    db.table("users").where_(("a", 1));

    db.raw_query("SELECT 1").await.unwrap();
    assert_eq!(db.raw_exec("DELETE FROM sessions").await.unwrap(), 1);
    assert_eq!(db.prepare("SELECT 2").await.unwrap(), "SELECT 2");

    assert_eq!(mock.calls().len(), 2);
    assert_eq!(db.to_sql(), "SELECT * FROM `users` WHERE `a` = :p1");
    assert_eq!(db.bindings().len(), 1);
}

#[tokio::test]
async fn dynamic_arguments_end_to_end() {
    let mock = MockExecutor::new();
    let mut db = QueryBuilder::new(&mock);

    db.table("users")
        .where_args(&[json!({"status": 1})])
        .unwrap()
        .where_args(&[json!("age"), json!(">"), json!(18)])
        .unwrap()
        .get()
        .await
        .unwrap();

    assert_eq!(
        mock.last_sql(),
        "SELECT * FROM `users` WHERE `status` = :p1 AND `age` > :p2"
    );

    assert!(matches!(
        db.table("users").where_args(&[json!([1, 2])]),
        Err(QbError::ArgumentType(_))
    ));
}

#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    email: Option<String>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
        })
    }
}

#[tokio::test]
async fn rows_map_into_structs() {
    let mock = MockExecutor::new();
    mock.respond(vec![
        Row::new().with("id", 1).with("email", "a@x.io"),
        Row::new().with("id", 2).with("email", Value::Null),
    ]);

    let mut db = QueryBuilder::new(&mock);
    let users = db
        .table("users")
        .get()
        .await
        .unwrap()
        .iter()
        .map(User::from_row)
        .collect::<QbResult<Vec<_>>>()
        .unwrap();

    assert_eq!(
        users,
        vec![
            User { id: 1, email: Some("a@x.io".into()) },
            User { id: 2, email: None },
        ]
    );
}
