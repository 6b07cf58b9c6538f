use bitis::bitmap::popcount;
use bitis::config::Config;
use bitis::server;
use bitis::store::Keyspace;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_args(&args);

    // The popcount kernel is picked once for the process lifetime.
    popcount::init(config.popcount.eq_ignore_ascii_case("scalar"));
    info!("Popcount kernel: {}", popcount::kernel_name());

    let store = Arc::new(Keyspace::new());
    let config = Arc::new(config);

    server::run_server(store, config).await
}
