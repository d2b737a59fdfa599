//! Runs the builder against a real postgres. Skipped when DATABASE_URL is unset.

use sqlchain::tokio_postgres::{self, Client, NoTls};
use sqlchain::{CompareOp, FromValue, QbError, QbResult, QueryBuilder};

async fn connect(test: &str) -> QbResult<Option<Client>> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            return Ok(None);
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .map_err(QbError::from_db_error)?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    // Temp tables are per-session, so concurrent tests don't collide.
    client
        .batch_execute(
            "CREATE TEMP TABLE items (
                id BIGSERIAL PRIMARY KEY,
                category TEXT NOT NULL,
                price NUMERIC(10, 2) NOT NULL,
                qty INT NOT NULL
            );
            INSERT INTO items (category, price, qty) VALUES
                ('a', 5.00, 1),
                ('a', 12.50, 3),
                ('b', 20.00, 3);",
        )
        .await
        .map_err(QbError::from_db_error)?;

    Ok(Some(client))
}

#[tokio::test]
async fn row_takes_first_of_many() -> QbResult<()> {
    let Some(client) = connect("row_takes_first_of_many").await? else {
        return Ok(());
    };
    let mut db = QueryBuilder::new(&client);

    let row = db.table("items").order_by_asc("id").row().await?;
    let row = row.ok_or_else(|| QbError::not_found("expected a row"))?;
    assert_eq!(row.get::<String>("category")?, "a");
    assert_eq!(row.get::<i64>("qty")?, 1);

    let none = db.table("items").where_(("category", "zzz")).row().await?;
    assert!(none.is_none());
    Ok(())
}

#[tokio::test]
async fn aggregate_over_several_groups() -> QbResult<()> {
    let Some(client) = connect("aggregate_over_several_groups").await? else {
        return Ok(());
    };
    let mut db = QueryBuilder::new(&client);

    let first_group = db
        .table("items")
        .group_by("category")
        .order_by_asc("category")
        .count()
        .await?;
    assert_eq!(first_group, 2);

    let total = db.table("items").count().await?;
    assert_eq!(total, 3);
    Ok(())
}

#[tokio::test]
async fn numbers_compare_against_numeric() -> QbResult<()> {
    let Some(client) = connect("numbers_compare_against_numeric").await? else {
        return Ok(());
    };
    let mut db = QueryBuilder::new(&client);

    let over_int = db
        .table("items")
        .where_(("price", CompareOp::Gt, 10))
        .count()
        .await?;
    assert_eq!(over_int, 2);

    let over_float = db
        .table("items")
        .where_(("price", CompareOp::Gt, 12.5))
        .count()
        .await?;
    assert_eq!(over_float, 1);

    let between = db
        .table("items")
        .where_between("price", "5", "12.50")
        .count()
        .await?;
    assert_eq!(between, 2);

    let spent = db.table("items").sum("price").await?;
    assert_eq!(f64::from_value(&spent).map_err(QbError::Other)?, 37.5);
    Ok(())
}

#[tokio::test]
async fn text_binds_to_integer_column() -> QbResult<()> {
    let Some(client) = connect("text_binds_to_integer_column").await? else {
        return Ok(());
    };
    let mut db = QueryBuilder::new(&client);

    let values = db
        .table("items")
        .where_(("qty", "3"))
        .order_by_asc("id")
        .list("price")
        .await?;
    let prices = values
        .iter()
        .map(f64::from_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(QbError::Other)?;
    assert_eq!(prices, vec![12.5, 20.0]);
    Ok(())
}
