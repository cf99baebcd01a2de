/// Application name
pub const APP_NAME: &str = "skeleton";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log target used by the kernel's default logger
pub const LOG_TARGET: &str = "skeleton";

/// Default directory (relative to the working directory) holding store databases
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default name of a multi-store's root store
pub const DEFAULT_ROOT_STORE: &str = "root";

/// Default delay between service start retries, in milliseconds
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1_000;
