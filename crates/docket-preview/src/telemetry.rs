//! Console logging for the preview binary.
//!
//! Events go to stderr through `tracing_subscriber::fmt`, leaving stdout for
//! the case numbers themselves. The level is taken from `RUST_LOG` and
//! defaults to `info`; use `RUST_LOG=docket=debug` to watch the allocator's
//! cache, probe and scan decisions.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;
    Ok(())
}
