use axum::Router;
use lambda_http::{run, Error};
use tracing::warn;
use library_api::core::controller::AppState;
use library_api::core::domain::Configuration;
use library_api::core::repository::RepositoryStore;
use library_api::loans::controller::loan_routes;
use library_api::utils::ddb::setup_tracing;

const DEV_MODE: bool = true;

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let (config, store) = if DEV_MODE {
        std::env::set_var("AWS_LAMBDA_FUNCTION_NAME", "_");
        std::env::set_var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE", "4096");
        std::env::set_var("AWS_LAMBDA_FUNCTION_VERSION", "1");
        std::env::set_var("AWS_LAMBDA_RUNTIME_API", "http://[::]:9000/.rt");
        (Configuration::from_env("dev"), RepositoryStore::from_env(true))
    } else {
        (Configuration::from_env("prod"), RepositoryStore::from_env(false))
    };
    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set, signing tokens with the development secret");
    }

    let app = Router::new()
        .merge(loan_routes())
        .with_state(AppState::new(config, store));

    run(app).await
}
