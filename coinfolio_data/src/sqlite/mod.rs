use std::str::FromStr;

use log::info;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod models;
pub mod ops;

const SCHEMA: &[&str] = &[
    r#"
    create table if not exists holdings (
        id integer primary key autoincrement,
        coin_id text not null unique,
        coin_name text not null,
        symbol text not null,
        quantity real not null check (quantity > 0),
        purchase_price real check (purchase_price is null or purchase_price >= 0),
        notes text,
        created_at text not null,
        updated_at text not null
    )
    "#,
    r#"
    create table if not exists watchlist (
        id integer primary key autoincrement,
        coin_id text not null unique,
        coin_name text not null,
        symbol text not null,
        added_at text not null
    )
    "#,
    r#"
    create table if not exists coin_cache (
        id text primary key,
        name text not null,
        symbol text not null,
        market_cap_rank integer,
        current_price real,
        market_cap real,
        price_change_24h real,
        price_change_percentage_24h real,
        last_updated text not null
    )
    "#,
    "create index if not exists coin_cache_rank_idx on coin_cache (market_cap_rank)",
    "create index if not exists coin_cache_updated_idx on coin_cache (last_updated)",
];

/// Opens (creating if needed) the database at `url` and ensures the schema exists.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    info!("Connected to database at {}", url);
    Ok(pool)
}

/// A private in-memory database. The pool is pinned to a single connection
/// that never expires, otherwise every new connection would see an empty database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("select 1").execute(pool).await?;
    Ok(())
}
