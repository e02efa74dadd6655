//! Logging setup

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a global tracing subscriber.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Set
/// `RUST_LOG=trainconf_tree=debug,trainconf_registry=debug` to trace document
/// loads and component resolution.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_without_panicking() {
        // Another test may have installed the subscriber first
        let _ = init();
        assert!(init().is_err());

        tracing::info!("logging initialised");
    }
}
