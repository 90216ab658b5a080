//! Consume sensor HTTP-transaction records and replay them through the
//! egress proxy.
use envconfig::Envconfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use replay_worker::config::Config;
use replay_worker::error::WorkerError;
use replay_worker::worker::ReplayWorker;

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    setup_tracing();

    let config = Config::init_from_env().expect("invalid configuration:");

    info!(
        topic = %config.kafka.kafka_topic,
        group = %config.kafka.kafka_consumer_group,
        proxy = %config.proxy_url,
        "starting replay worker"
    );

    let worker = ReplayWorker::new(&config)?;
    worker.run().await
}
