use actix_web::{web, get, post, put, delete, HttpResponse, Responder};
use chrono::Utc;
use sqlx::SqlitePool;

use coinfolio_data::sqlite;
use coinfolio_data::sqlite::ops::{holding, watchlist};
use coinfolio_domain::analytics::CompareRequest;
use coinfolio_domain::models::{
    validation,
    ValidationError,
    NewHoldingRequest,
    HoldingPatchRequest,
    NewWatchlistEntryRequest,
    clamp_history_days,
};
use coinfolio_market::{MarketData, clamp_search_limit, DEFAULT_SEARCH_LIMIT};

use crate::api::convert::ToResponse;
use crate::api::models::{
    MessageResponse,
    HealthResponse,
    CoinsPageQuery,
    CoinsPageResponse,
    SearchQuery,
    SearchResponse,
    PriceResponse,
    HistoryQuery,
    HistoryResponse,
    PortfolioResponse,
    WatchlistResponse,
    PortfolioAnalyticsResponse,
    CompareResponse,
    ExportQuery,
    ExportResponse,
};
use crate::error::ApiError;
use crate::export::{self, ExportFormat};
use crate::service::{self, CoinCachePolicy};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 50;
const DEFAULT_HISTORY_DAYS: u32 = 30;

#[get("/health")]
pub async fn health(db: web::Data<SqlitePool>, market: web::Data<dyn MarketData>) -> impl Responder {
    let database = sqlite::ping(db.get_ref()).await.is_ok();
    let api = market.ping().await;

    HttpResponse::Ok().json(HealthResponse {
        status: if database { "healthy" } else { "degraded" },
        timestamp: Utc::now(),
        database: if database { "connected" } else { "disconnected" },
        api: if api { "connected" } else { "disconnected" },
        cache_entries: market.cache_entries(),
    })
}

//

#[get("/coins/all")]
pub async fn get_all_coins(
    query: web::Query<CoinsPageQuery>,
    db: web::Data<SqlitePool>,
    market: web::Data<dyn MarketData>,
    policy: web::Data<CoinCachePolicy>,
) -> impl Responder {

    let result = service::coins_page(
        db.get_ref(),
        market.get_ref(),
        policy.get_ref(),
        query.page.unwrap_or(DEFAULT_PAGE),
        query.per_page.unwrap_or(DEFAULT_PER_PAGE),
    ).await;

    match result {
        Ok(page) => HttpResponse::Ok().json(CoinsPageResponse::from(page)),
        Err(e) => e.to_response(),
    }
}

#[get("/coins/search")]
pub async fn search_coins(query: web::Query<SearchQuery>, market: web::Data<dyn MarketData>) -> impl Responder {
    let query = query.into_inner();
    let q = match query.q {
        None => return ApiError::from(ValidationError::MissingField { field: "q" }).to_response(),
        Some(x) => x,
    };

    let limit = clamp_search_limit(query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
    match market.search(&q, limit).await {
        Ok(results) => HttpResponse::Ok().json(SearchResponse { results }),
        Err(e) => ApiError::from(e).to_response(),
    }
}

#[get("/coins/{id}/price")]
pub async fn get_coin_price(id: web::Path<String>, market: web::Data<dyn MarketData>) -> impl Responder {
    let coin_id = match validation::coin_id("coin_id", Some(id.into_inner())) {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    match market.price(&coin_id).await {
        Ok(snapshot) => HttpResponse::Ok().json(PriceResponse { coin_id, snapshot }),
        Err(e) => ApiError::from(e).to_response(),
    }
}

#[get("/coins/{id}/history")]
pub async fn get_coin_history(
    id: web::Path<String>,
    query: web::Query<HistoryQuery>,
    market: web::Data<dyn MarketData>,
) -> impl Responder {

    let coin_id = match validation::coin_id("coin_id", Some(id.into_inner())) {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    let days = clamp_history_days(query.days.unwrap_or(DEFAULT_HISTORY_DAYS));
    match market.history(&coin_id, days).await {
        Ok(data) => HttpResponse::Ok().json(HistoryResponse { coin_id, days, data }),
        Err(e) => ApiError::from(e).to_response(),
    }
}

//

#[get("/portfolio")]
pub async fn get_portfolio(db: web::Data<SqlitePool>, market: web::Data<dyn MarketData>) -> impl Responder {
    match service::portfolio_analytics(db.get_ref(), market.get_ref()).await {
        Ok(x) => HttpResponse::Ok().json(PortfolioResponse {
            portfolio: x.holdings,
            summary: x.summary,
        }),
        Err(e) => e.to_response(),
    }
}

#[post("/portfolio")]
pub async fn add_holding(body: web::Json<NewHoldingRequest>, db: web::Data<SqlitePool>) -> impl Responder {
    let new_holding = match body.into_inner().validate() {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    match holding::add_or_merge(&new_holding, Utc::now(), db.get_ref()).await {
        Ok(stored) => HttpResponse::Created().json(stored),
        Err(e) => ApiError::from(e).to_response(),
    }
}

#[put("/portfolio/{id}")]
pub async fn update_holding(
    id: web::Path<i64>,
    body: web::Json<HoldingPatchRequest>,
    db: web::Data<SqlitePool>,
) -> impl Responder {

    let patch = match body.into_inner().validate() {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    match holding::update(id.into_inner(), &patch, Utc::now(), db.get_ref()).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => ApiError::from(e).to_response(),
    }
}

#[delete("/portfolio/{id}")]
pub async fn delete_holding(id: web::Path<i64>, db: web::Data<SqlitePool>) -> impl Responder {
    match holding::delete(id.into_inner(), db.get_ref()).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse { message: "Holding deleted" }),
        Err(e) => ApiError::from(e).to_response(),
    }
}

//

#[get("/watchlist")]
pub async fn get_watchlist(db: web::Data<SqlitePool>, market: web::Data<dyn MarketData>) -> impl Responder {
    match service::watchlist_items(db.get_ref(), market.get_ref()).await {
        Ok(watchlist) => HttpResponse::Ok().json(WatchlistResponse { watchlist }),
        Err(e) => e.to_response(),
    }
}

#[post("/watchlist")]
pub async fn add_to_watchlist(body: web::Json<NewWatchlistEntryRequest>, db: web::Data<SqlitePool>) -> impl Responder {
    let entry = match body.into_inner().validate() {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    match watchlist::insert(&entry, Utc::now(), db.get_ref()).await {
        Ok(stored) => HttpResponse::Created().json(stored),
        Err(e) => ApiError::from(e).to_response(),
    }
}

#[delete("/watchlist/{id}")]
pub async fn remove_from_watchlist(id: web::Path<i64>, db: web::Data<SqlitePool>) -> impl Responder {
    match watchlist::delete(id.into_inner(), db.get_ref()).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse { message: "Removed from watchlist" }),
        Err(e) => ApiError::from(e).to_response(),
    }
}

//

#[get("/analytics/portfolio")]
pub async fn get_portfolio_analytics(db: web::Data<SqlitePool>, market: web::Data<dyn MarketData>) -> impl Responder {
    match service::portfolio_analytics(db.get_ref(), market.get_ref()).await {
        Ok(x) => HttpResponse::Ok().json(PortfolioAnalyticsResponse {
            analytics: x.summary,
            holdings: x.holdings,
            timestamp: Utc::now(),
        }),
        Err(e) => e.to_response(),
    }
}

#[get("/analytics/market")]
pub async fn get_market_analytics(market: web::Data<dyn MarketData>) -> impl Responder {
    match service::market_overview(market.get_ref()).await {
        Ok(overview) => HttpResponse::Ok().json(overview),
        Err(e) => e.to_response(),
    }
}

#[post("/compare")]
pub async fn compare_coins(body: web::Json<CompareRequest>, market: web::Data<dyn MarketData>) -> impl Responder {
    let comparison = match body.into_inner().validate() {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    let coins = service::compare(market.get_ref(), &comparison).await;
    HttpResponse::Ok().json(CompareResponse { days: comparison.days, coins })
}

#[get("/export/portfolio")]
pub async fn export_portfolio(query: web::Query<ExportQuery>, db: web::Data<SqlitePool>) -> impl Responder {
    let format = match query.format.as_deref().unwrap_or("json").parse::<ExportFormat>() {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    let holdings = match holding::list(db.get_ref()).await {
        Ok(x) => x,
        Err(e) => return ApiError::from(e).to_response(),
    };

    let filename = format.filename(Utc::now());
    match format {
        ExportFormat::Json => HttpResponse::Ok().json(ExportResponse { data: holdings, filename }),
        ExportFormat::Csv => match export::holdings_csv(&holdings) {
            Ok(data) => HttpResponse::Ok().json(ExportResponse { data, filename }),
            Err(source) => ApiError::Export { source }.to_response(),
        },
    }
}
