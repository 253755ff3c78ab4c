//! Product service: the catalogue.

use recsys_postgres::PostgresProductRepository;
use recsys_server::{Config, Service, StartupError, bootstrap, lifecycle};
use recsys_services::ProductService;
use recsys_web::handlers::products;
use std::sync::Arc;

const SERVICE: Service = Service::Product;

async fn run(config: &Config) -> Result<(), StartupError> {
    let pool = bootstrap::connect_database(config).await?;
    let bus = bootstrap::connect_bus(config).await?;
    let tokens = Arc::new(bootstrap::token_issuer(config)?);

    let service = ProductService::new(Arc::new(PostgresProductRepository::new(pool)), bus);

    lifecycle::serve(config, products::router(service, tokens), Vec::new()).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = recsys_server::init(SERVICE)?;
    run(&config)
        .await
        .map_err(|e| recsys_server::fatal(SERVICE, e))
}
