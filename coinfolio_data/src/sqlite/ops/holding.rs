use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqlitePool;

use coinfolio_domain::models::{Holding, NewHolding, HoldingPatch};

use crate::error::StoreError;
use crate::sqlite::models::HoldingRow;

const ENTITY: &str = "Holding";

/// Adds a position, or folds it into the existing position for the same coin.
///
/// The merge happens in a single statement so concurrent adds of one coin
/// cannot lose quantity. Purchase price becomes the quantity-weighted average
/// when both sides know it, otherwise whichever side has one.
pub async fn add_or_merge(
    holding: &NewHolding,
    now: DateTime<Utc>,
    pool: &SqlitePool)
    -> Result<Holding, StoreError>
{
    let row = sqlx::query_as::<_, HoldingRow>(r#"
        insert into holdings (
            coin_id,
            coin_name,
            symbol,
            quantity,
            purchase_price,
            notes,
            created_at,
            updated_at
        )
        values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        on conflict (coin_id) do update set
            quantity = holdings.quantity + excluded.quantity,
            purchase_price = case
                when holdings.purchase_price is null then excluded.purchase_price
                when excluded.purchase_price is null then holdings.purchase_price
                else (holdings.quantity * holdings.purchase_price
                      + excluded.quantity * excluded.purchase_price)
                     / (holdings.quantity + excluded.quantity)
            end,
            notes = coalesce(excluded.notes, holdings.notes),
            updated_at = excluded.updated_at
        returning id, coin_id, coin_name, symbol, quantity, purchase_price, notes, created_at, updated_at
        "#)
        .bind(&holding.coin_id)
        .bind(&holding.coin_name)
        .bind(&holding.symbol)
        .bind(holding.quantity)
        .bind(holding.purchase_price)
        .bind(&holding.notes)
        .bind(now)
        .fetch_one(pool)
        .await?;

    debug!("Stored holding #{} ({} x {})", row.id, row.coin_id, row.quantity);
    Ok(row.into())
}

/// Newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<Holding>, StoreError> {
    let rows = sqlx::query_as::<_, HoldingRow>(r#"
        select id, coin_id, coin_name, symbol, quantity, purchase_price, notes, created_at, updated_at
        from holdings
        order by created_at desc, id desc
        "#)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Holding::from).collect())
}

pub async fn get(id: i64, pool: &SqlitePool) -> Result<Holding, StoreError> {
    sqlx::query_as::<_, HoldingRow>(r#"
        select id, coin_id, coin_name, symbol, quantity, purchase_price, notes, created_at, updated_at
        from holdings
        where id = ?1
        "#)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Holding::from)
        .ok_or_else(|| not_found(id))
}

/// Applies only the fields present in `patch`. A patch carrying
/// `Some(None)` for an optional field clears it.
pub async fn update(
    id: i64,
    patch: &HoldingPatch,
    now: DateTime<Utc>,
    pool: &SqlitePool)
    -> Result<Holding, StoreError>
{
    let row = sqlx::query_as::<_, HoldingRow>(r#"
        update holdings set
            quantity = coalesce(?1, quantity),
            purchase_price = case when ?2 then ?3 else purchase_price end,
            notes = case when ?4 then ?5 else notes end,
            updated_at = ?6
        where id = ?7
        returning id, coin_id, coin_name, symbol, quantity, purchase_price, notes, created_at, updated_at
        "#)
        .bind(patch.quantity)
        .bind(patch.purchase_price.is_some())
        .bind(patch.purchase_price.flatten())
        .bind(patch.notes.is_some())
        .bind(patch.notes.clone().flatten())
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Holding::from).ok_or_else(|| not_found(id))
}

pub async fn delete(id: i64, pool: &SqlitePool) -> Result<(), StoreError> {
    let result = sqlx::query("delete from holdings where id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

fn not_found(id: i64) -> StoreError {
    StoreError::NotFound { entity: ENTITY, key: id.to_string() }
}
