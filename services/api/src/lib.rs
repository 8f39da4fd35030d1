mod cli;
mod estimate;
mod infra;
mod routes;
mod server;

use moto_valuation::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
