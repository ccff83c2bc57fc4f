use std::io;

use actix_web::{middleware, web, App, HttpServer};
use env_logger::{Builder, Env};
use log::{debug, info};

use flat_twitter::{handlers, AppState, Config, Store};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let dotenv_result = dotenv::dotenv();

    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    if let Err(e) = dotenv_result {
        debug!("No .env file loaded: {}", e);
    }

    info!("Starting flat-file Twitter backend...");
    let config = Config::from_env().map_err(io::Error::other)?;

    let store = Store::open(&config.storage)
        .await
        .map_err(io::Error::other)?;
    info!(
        "Opened collections {} and {}",
        store.users.path().display(),
        store.tweets.path().display()
    );

    let state = web::Data::new(AppState {
        store,
        bcrypt_cost: config.bcrypt_cost,
    });

    info!(
        "Listening on {} with {} workers",
        config.bind_address, config.workers
    );
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .workers(config.workers)
    .bind(&config.bind_address)?
    .run()
    .await
}
