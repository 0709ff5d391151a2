//! Structured logging setup (`§2.1`), following the teacher's convention
//! of a small wrapper crate (`iroha_logger`) that installs one global
//! `tracing` subscriber at process startup; this core inlines the
//! equivalent setup directly since it does not vendor a separate logging
//! crate.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs a global `tracing` subscriber reading its filter from
/// `RUST_LOG` (default `info`). Idempotent: a second call is a no-op if a
/// global subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
