use log::LevelFilter;

/// Installs `pretty_env_logger` as the global logger.
///
/// `RUST_LOG` takes precedence; without it everything at `info` and above is shown.
pub fn init() {
    let mut builder = pretty_env_logger::formatted_builder();

    match std::env::var("RUST_LOG") {
        Ok(filter) => {
            builder.parse_filters(&filter);
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Info);
        }
    }

    if builder.try_init().is_err() {
        log::warn!("Logger was already initialized");
    }
}
