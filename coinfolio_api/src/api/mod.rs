pub mod models;
pub mod routes;
mod convert;

use actix_web::{web, HttpResponse, Scope};
use actix_web::error::InternalError;

use crate::api::models::ErrorResponse;

pub fn services() -> Scope {
    web::scope("/api")
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(routes::health)
        .service(routes::get_all_coins)
        .service(routes::search_coins)
        .service(routes::get_coin_price)
        .service(routes::get_coin_history)
        .service(routes::get_portfolio)
        .service(routes::add_holding)
        .service(routes::update_holding)
        .service(routes::delete_holding)
        .service(routes::get_watchlist)
        .service(routes::add_to_watchlist)
        .service(routes::remove_from_watchlist)
        .service(routes::get_portfolio_analytics)
        .service(routes::get_market_analytics)
        .service(routes::compare_coins)
        .service(routes::export_portfolio)
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest()
            .json(ErrorResponse::new(format!("Invalid request body: {}", err)));
        InternalError::from_response(err, response).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest()
            .json(ErrorResponse::new(format!("Invalid query string: {}", err)));
        InternalError::from_response(err, response).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest()
            .json(ErrorResponse::new(format!("Invalid path: {}", err)));
        InternalError::from_response(err, response).into()
    })
}
