use chrono::{DateTime, Utc};
use log::info;
use sqlx::SqlitePool;

use coinfolio_domain::models::CachedCoinSummary;

use crate::error::StoreError;
use crate::sqlite::models::CoinCacheRow;

/// Replaces the cached listing rows for `coins`, dropping anything older than
/// `stale_before` in the same transaction. Returns the number of rows written.
pub async fn upsert_many(
    coins: &[CachedCoinSummary],
    stale_before: DateTime<Utc>,
    pool: &SqlitePool)
    -> Result<usize, StoreError>
{
    let mut tx = pool.begin().await?;

    let purged = sqlx::query("delete from coin_cache where last_updated < ?1")
        .bind(stale_before)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    for coin in coins {
        sqlx::query(r#"
            insert into coin_cache (
                id,
                name,
                symbol,
                market_cap_rank,
                current_price,
                market_cap,
                price_change_24h,
                price_change_percentage_24h,
                last_updated
            )
            values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            on conflict (id) do update set
                name = excluded.name,
                symbol = excluded.symbol,
                market_cap_rank = excluded.market_cap_rank,
                current_price = excluded.current_price,
                market_cap = excluded.market_cap,
                price_change_24h = excluded.price_change_24h,
                price_change_percentage_24h = excluded.price_change_percentage_24h,
                last_updated = excluded.last_updated
            "#)
            .bind(&coin.id)
            .bind(&coin.name)
            .bind(&coin.symbol)
            .bind(coin.market_cap_rank)
            .bind(coin.current_price)
            .bind(coin.market_cap)
            .bind(coin.price_change_24h)
            .bind(coin.price_change_percentage_24h)
            .bind(coin.last_updated)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    if purged > 0 {
        info!("Purged {} stale coin cache rows", purged);
    }
    Ok(coins.len())
}

/// Rows refreshed at or after `fresh_since`, ranked coins first.
pub async fn list_fresh(
    fresh_since: DateTime<Utc>,
    limit: i64,
    offset: i64,
    pool: &SqlitePool)
    -> Result<Vec<CachedCoinSummary>, StoreError>
{
    let rows = sqlx::query_as::<_, CoinCacheRow>(r#"
        select id, name, symbol, market_cap_rank, current_price, market_cap,
               price_change_24h, price_change_percentage_24h, last_updated
        from coin_cache
        where last_updated >= ?1
        order by market_cap_rank is null, market_cap_rank asc, id asc
        limit ?2 offset ?3
        "#)
        .bind(fresh_since)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(CachedCoinSummary::from).collect())
}

/// Fresh rows whose `market_cap_rank` lies in `first_rank..=last_rank`,
/// in rank order. Unranked rows never match.
pub async fn list_fresh_ranks(
    fresh_since: DateTime<Utc>,
    first_rank: i64,
    last_rank: i64,
    pool: &SqlitePool)
    -> Result<Vec<CachedCoinSummary>, StoreError>
{
    let rows = sqlx::query_as::<_, CoinCacheRow>(r#"
        select id, name, symbol, market_cap_rank, current_price, market_cap,
               price_change_24h, price_change_percentage_24h, last_updated
        from coin_cache
        where last_updated >= ?1 and market_cap_rank between ?2 and ?3
        order by market_cap_rank asc, id asc
        "#)
        .bind(fresh_since)
        .bind(first_rank)
        .bind(last_rank)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(CachedCoinSummary::from).collect())
}

pub async fn count_fresh(fresh_since: DateTime<Utc>, pool: &SqlitePool) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("select count(*) from coin_cache where last_updated >= ?1")
        .bind(fresh_since)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn get_fresh(
    id: &str,
    fresh_since: DateTime<Utc>,
    pool: &SqlitePool)
    -> Result<Option<CachedCoinSummary>, StoreError>
{
    let row = sqlx::query_as::<_, CoinCacheRow>(r#"
        select id, name, symbol, market_cap_rank, current_price, market_cap,
               price_change_24h, price_change_percentage_24h, last_updated
        from coin_cache
        where id = ?1 and last_updated >= ?2
        "#)
        .bind(id)
        .bind(fresh_since)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(CachedCoinSummary::from))
}

pub async fn delete(id: &str, pool: &SqlitePool) -> Result<(), StoreError> {
    let result = sqlx::query("delete from coin_cache where id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity: "Cached coin", key: id.to_owned() });
    }
    Ok(())
}

pub async fn purge_stale(stale_before: DateTime<Utc>, pool: &SqlitePool) -> Result<u64, StoreError> {
    let result = sqlx::query("delete from coin_cache where last_updated < ?1")
        .bind(stale_before)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::sqlite::connect_in_memory;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn coin(id: &str, rank: Option<i64>, last_updated: DateTime<Utc>) -> CachedCoinSummary {
        CachedCoinSummary {
            id: id.to_owned(),
            name: id.to_owned(),
            symbol: id.to_uppercase(),
            market_cap_rank: rank,
            current_price: Some(1.0),
            market_cap: None,
            price_change_24h: None,
            price_change_percentage_24h: None,
            last_updated,
        }
    }

    #[tokio::test]
    async fn fresh_rows_are_ranked_with_unranked_last() {
        let pool = connect_in_memory().await.unwrap();

        let coins = vec![
            coin("unranked", None, at(0)),
            coin("ethereum", Some(2), at(0)),
            coin("bitcoin", Some(1), at(0)),
        ];
        assert_eq!(upsert_many(&coins, at(-60), &pool).await.unwrap(), 3);

        let ids: Vec<_> = list_fresh(at(-60), 10, 0, &pool).await.unwrap()
            .into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum", "unranked"]);

        let page: Vec<_> = list_fresh(at(-60), 1, 1, &pool).await.unwrap()
            .into_iter().map(|c| c.id).collect();
        assert_eq!(page, vec!["ethereum"]);
        assert_eq!(count_fresh(at(-60), &pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn rank_window_ignores_rows_outside_it() {
        let pool = connect_in_memory().await.unwrap();

        let coins = vec![
            coin("cardano", Some(7), at(0)),
            coin("solana", Some(6), at(0)),
            coin("unranked", None, at(0)),
            coin("polkadot", Some(11), at(0)),
        ];
        upsert_many(&coins, at(-60), &pool).await.unwrap();

        let first: Vec<_> = list_fresh_ranks(at(-60), 1, 5, &pool).await.unwrap();
        assert!(first.is_empty());

        let second: Vec<_> = list_fresh_ranks(at(-60), 6, 10, &pool).await.unwrap()
            .into_iter().map(|c| c.id).collect();
        assert_eq!(second, vec!["solana", "cardano"]);

        assert!(list_fresh_ranks(at(30), 6, 10, &pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_rows_are_hidden_then_purged() {
        let pool = connect_in_memory().await.unwrap();

        upsert_many(&[coin("dogecoin", Some(9), at(0))], at(-60), &pool).await.unwrap();

        // Two hours later with a one hour max age.
        let cutoff = at(60);
        assert!(list_fresh(cutoff, 10, 0, &pool).await.unwrap().is_empty());
        assert_eq!(get_fresh("dogecoin", cutoff, &pool).await.unwrap(), None);
        assert_eq!(count_fresh(cutoff, &pool).await.unwrap(), 0);

        upsert_many(&[coin("bitcoin", Some(1), at(120))], cutoff, &pool).await.unwrap();
        assert_eq!(purge_stale(cutoff, &pool).await.unwrap(), 0);
        assert!(matches!(delete("dogecoin", &pool).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_row() {
        let pool = connect_in_memory().await.unwrap();

        upsert_many(&[coin("bitcoin", Some(2), at(0))], at(-60), &pool).await.unwrap();
        upsert_many(&[coin("bitcoin", Some(1), at(5))], at(-60), &pool).await.unwrap();

        let cached = get_fresh("bitcoin", at(-60), &pool).await.unwrap().unwrap();
        assert_eq!(cached.market_cap_rank, Some(1));
        assert_eq!(cached.last_updated, at(5));

        delete("bitcoin", &pool).await.unwrap();
        assert_eq!(get_fresh("bitcoin", at(-60), &pool).await.unwrap(), None);
    }
}
