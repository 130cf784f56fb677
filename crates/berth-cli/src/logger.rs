//! Logging setup
//!
//! Logs go to stderr so stdout stays machine-readable. `RUST_LOG` takes
//! precedence over both defaults.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const QUIET: &str = "berth=error,berth_kube=error,berth_compose=error";
const DEBUG: &str = "berth=debug,berth_kube=debug,berth_compose=debug";

pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { DEBUG } else { QUIET }));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
