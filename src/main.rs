use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use quadruped_trot_runtime::config::RuntimeOptions;

#[tokio::main]
async fn main() {
    let options = RuntimeOptions::parse();

    // Setup logging (set RUST_LOG=info or debug)
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = quadruped_trot_runtime::runtime::run(options).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
