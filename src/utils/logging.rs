use std::sync::Once;

/// Installs `env_logger` once per process.
///
/// `RUST_LOG` wins when set; otherwise `showroom` logs at `info` and wgpu's
/// chatty modules at `warn`.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(log::LevelFilter::Warn)
            .filter_module("showroom", log::LevelFilter::Info)
            .filter_module("wgpu_core", log::LevelFilter::Warn)
            .filter_module("wgpu_hal", log::LevelFilter::Warn)
            .parse_default_env();
        if builder.try_init().is_err() {
            log::debug!("A logger was already installed");
        }
    });
}
