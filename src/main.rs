//! Server binary: load config, open the database, serve the API.

use reply_desk::{config::Config, db, http};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Configuration error: {}", err);
            std::process::exit(1);
        }
    };

    if config.google_client_id.is_none() {
        log::warn!(
            "GOOGLE_CLIENT_ID is not set; OAuth, sync and publishing are disabled until it is"
        );
    }

    let db_path = db::get_db_path(&config.data_dir);
    let pool = match db::initialize(&db_path).await {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("Failed to initialize database at {}: {}", db_path.display(), err);
            std::process::exit(1);
        }
    };

    log::info!("Database ready at {}", db_path.display());

    if let Err(err) = http::serve(config, pool).await {
        log::error!("Server error: {}", err);
        std::process::exit(1);
    }
}
