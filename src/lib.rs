pub mod config;
pub mod discover;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod query;
pub mod store;

pub use config::Config;
pub use error::{DateParseError, IngestError, StoreError};
pub use process::record::TicketRecord;

/// `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .try_init();
}
