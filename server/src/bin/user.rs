//! User service: profiles, likes, dislikes, purchases.

use recsys_postgres::PostgresUserRepository;
use recsys_server::{Config, Service, StartupError, bootstrap, lifecycle};
use recsys_services::UserService;
use recsys_web::handlers::users;
use std::sync::Arc;

const SERVICE: Service = Service::User;

async fn run(config: &Config) -> Result<(), StartupError> {
    let pool = bootstrap::connect_database(config).await?;
    let bus = bootstrap::connect_bus(config).await?;
    let cache = bootstrap::connect_cache(config)?;
    let tokens = Arc::new(bootstrap::token_issuer(config)?);

    let service = UserService::new(
        Arc::new(PostgresUserRepository::new(pool)),
        cache,
        bus,
        config.cache,
    );

    lifecycle::serve(config, users::router(service, tokens), Vec::new()).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = recsys_server::init(SERVICE)?;
    run(&config)
        .await
        .map_err(|e| recsys_server::fatal(SERVICE, e))
}
