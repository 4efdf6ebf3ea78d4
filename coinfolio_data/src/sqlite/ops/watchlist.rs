use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use coinfolio_domain::models::{WatchlistEntry, NewWatchlistEntry};

use crate::error::StoreError;
use crate::sqlite::models::WatchlistRow;

const ENTITY: &str = "Watchlist entry";

/// Fails with `Conflict` when the coin is already watched.
pub async fn insert(
    entry: &NewWatchlistEntry,
    now: DateTime<Utc>,
    pool: &SqlitePool)
    -> Result<WatchlistEntry, StoreError>
{
    let result = sqlx::query_as::<_, WatchlistRow>(r#"
        insert into watchlist (coin_id, coin_name, symbol, added_at)
        values (?1, ?2, ?3, ?4)
        returning id, coin_id, coin_name, symbol, added_at
        "#)
        .bind(&entry.coin_id)
        .bind(&entry.coin_name)
        .bind(&entry.symbol)
        .bind(now)
        .fetch_one(pool)
        .await;

    match result {
        Ok(row) => Ok(row.into()),
        Err(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
            Err(StoreError::Conflict { entity: ENTITY, key: entry.coin_id.clone() })
        }
        Err(source) => Err(StoreError::Sql { source }),
    }
}

/// Most recently added first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<WatchlistEntry>, StoreError> {
    let rows = sqlx::query_as::<_, WatchlistRow>(r#"
        select id, coin_id, coin_name, symbol, added_at
        from watchlist
        order by added_at desc, id desc
        "#)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(WatchlistEntry::from).collect())
}

pub async fn get(id: i64, pool: &SqlitePool) -> Result<WatchlistEntry, StoreError> {
    sqlx::query_as::<_, WatchlistRow>(r#"
        select id, coin_id, coin_name, symbol, added_at
        from watchlist
        where id = ?1
        "#)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(WatchlistEntry::from)
        .ok_or_else(|| StoreError::NotFound { entity: ENTITY, key: id.to_string() })
}

pub async fn delete(id: i64, pool: &SqlitePool) -> Result<(), StoreError> {
    let result = sqlx::query("delete from watchlist where id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity: ENTITY, key: id.to_string() });
    }
    Ok(())
}
