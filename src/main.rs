use board_governance::commands::{self, Cli};
use clap::Parser;
use log::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    // Logging; RUST_LOG may be set in .env
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli).await {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
