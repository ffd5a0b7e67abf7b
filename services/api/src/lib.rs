mod cli;
mod infra;
mod routes;
mod server;

use continuing_education::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
