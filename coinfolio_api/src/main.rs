mod api;
mod config;
mod error;
mod export;
mod refresh;
mod service;

#[cfg(test)]
mod testing;

use std::error::Error;
use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer, middleware};
use dotenv::dotenv;
use listenfd::ListenFd;
use log::{info, warn};

use coinfolio_util::init_logging;
use coinfolio_data::sqlite;
use coinfolio_market::{CachedMarketData, CoinGeckoClient, MarketData, RateIntervals, RetryPolicy};

use crate::config::Config;
use crate::refresh::CoinCacheRefresher;
use crate::service::CoinCachePolicy;

const DEFAULT_LOG_FILTERS: &str =
    "actix_server=info,actix_web=info,sqlx=warn,coinfolio_api=info,coinfolio_market=info,coinfolio_data=info,warn";

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let env_result = dotenv();
    init_logging(DEFAULT_LOG_FILTERS);

    if let Err(err) = env_result {
        warn!("Failed to load .env file: {}", err);
    }

    let config = Config::from_env()?;

    // Enable receiving passed file descriptors
    // Launch using `systemfd --no-pid -s http::PORT -- cargo watch -x run` to leverage this
    //
    let mut listenfd = ListenFd::from_env();

    // Database
    let db_pool = sqlite::connect(&config.database_url).await?;

    // Market data
    let retry = RetryPolicy {
        max_attempts: config.retry_attempts,
        ..RetryPolicy::default()
    };
    let client = CoinGeckoClient::new(&config.coingecko_url, config.http_timeout, retry, RateIntervals::default())?;
    let market: Arc<dyn MarketData> = Arc::new(CachedMarketData::new(client, config.cache_ttl));

    let policy = CoinCachePolicy { max_age: config.coin_cache_max_age };

    if config.refresh_interval.is_zero() {
        info!("Coin cache refresh disabled");
    } else {
        let refresher = CoinCacheRefresher::new(db_pool.clone(), market.clone(), policy, config.refresh_interval);
        tokio::spawn(refresher.into_run());
    }

    let db_data = web::Data::new(db_pool);
    let market_data: web::Data<dyn MarketData> = web::Data::from(market);
    let policy_data = web::Data::new(policy);

    // HTTP Server
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new(r#"%{r}a [%a] "%r" %s %b "%{Referer}i" "%{User-Agent}i" %Dms"#))
            .wrap(middleware::Compress::default())
            .app_data(db_data.clone())
            .app_data(market_data.clone())
            .app_data(policy_data.clone())
            .service(api::services())
    });

    // Launch server from listenfd
    server = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            info!("Using listenfd");
            server.listen(listener)?
        },
        None => {
            let addr = config.bind_address();
            info!("Binding to {}", addr);
            server.bind(addr)?
        }
    };

    info!("Starting server");
    server.run().await?;
    Ok(())
}
