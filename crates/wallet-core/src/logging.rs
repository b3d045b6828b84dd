use env_logger::Env;

/// Installs the global logger, honouring `RUST_LOG` and falling back to
/// `default_level`. Later calls are no-ops.
pub fn init_logging(default_level: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}
