//! SSO service: registration and login.

use recsys_postgres::PostgresIdentityRepository;
use recsys_server::{Config, Service, StartupError, bootstrap, lifecycle};
use recsys_services::{IdentityService, PasswordHasher};
use recsys_web::handlers::auth;
use std::sync::Arc;

const SERVICE: Service = Service::Sso;

async fn run(config: &Config) -> Result<(), StartupError> {
    let pool = bootstrap::connect_database(config).await?;
    let bus = bootstrap::connect_bus(config).await?;
    let tokens = bootstrap::token_issuer(config)?;

    let identity = IdentityService::new(
        Arc::new(PostgresIdentityRepository::new(pool)),
        bus,
        PasswordHasher::default(),
        tokens,
    );

    lifecycle::serve(config, auth::router(identity), Vec::new()).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = recsys_server::init(SERVICE)?;
    run(&config)
        .await
        .map_err(|e| recsys_server::fatal(SERVICE, e))
}
