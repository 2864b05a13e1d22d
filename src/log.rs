/// Install the logger for whichever front-end is running.
///
/// `debug_enabled` comes from the front-end: the CLI sets it when the `TEAMSPLIT_DEBUG`
/// environment variable is present, and the wasm `initialize(debug)` export passes the
/// flag the page gave it. It picks `Debug` over `Info` as the default level.
///
/// - **Native:** env_logger on stderr without timestamps or module paths. A `RUST_LOG`
///   filter, when set, is applied on top of the default level.
/// - **WASM:** console_log into the browser console. If that fails the error goes to
///   `console.error` and solving continues without logs.
///
/// Calling it a second time leaves the first logger in place.
pub fn init_logger(debug_enabled: bool) {
    let level = if debug_enabled { log::Level::Debug } else { log::Level::Info };

    #[cfg(target_arch = "wasm32")]
    {
        match console_log::init_with_level(level) {
            Ok(()) => log::info!("WASM logger initialized at {level:?} level"),
            Err(e) => {
                let msg = format!("Failed to initialize console_log: {e}. Logging will be unavailable.");
                web_sys::console::error_1(&msg.into());
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(level.to_level_filter())
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false);

        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }

        if builder.try_init().is_ok() {
            log::debug!("Native logger initialized at {level:?} level (TEAMSPLIT_DEBUG or RUST_LOG for more)");
        }
    }
}
