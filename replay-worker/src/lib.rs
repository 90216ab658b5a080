pub mod config;
pub mod dedup;
pub mod error;
pub mod metrics_consts;
pub mod record;
pub mod replay;
pub mod worker;
