use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,strata_migrate=info,strata_sqlx=info,strata_cli=info";

/// Install a global fmt subscriber writing to stderr.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
