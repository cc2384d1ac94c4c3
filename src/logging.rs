use std::sync::Once;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "formguide=info";

static INIT: Once = Once::new();

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once.
pub fn init() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        if let Err(err) = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
        {
            eprintln!("formguide: logging already initialised: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::info!("logging initialised twice without panicking");
    }
}
