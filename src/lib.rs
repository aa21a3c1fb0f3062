//! note-rewrite — selection rewriting core.
//!
//! Module map:
//!   - llm/         — action registry, prompt compiler, generators, recovery
//!   - commands.rs  — transport-agnostic request handler (status + JSON payload)
//!   - config.rs    — settings, provider resolution, API key lookup
//!   - error.rs     — hard errors (validation, credential, transport, backend)
//!
//! No transport lives here. Binaries and servers wrap `commands::RewriteService`.

pub mod commands;
pub mod config;
pub mod error;
pub mod llm;

pub use commands::{CommandResponse, RewriteService};
pub use config::Settings;
pub use error::{RewriteError, ValidationError};

/// Load `.env.local` → `.env` from the working directory and start logging.
///
/// Call once at process start. Safe to call when no env file exists.
pub fn init() {
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let loaded = config::load_env_files(&cwd);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .ok();

    match loaded {
        Some(path) => log::info!("[STARTUP] Loaded {}", path.display()),
        None => log::info!("[STARTUP] No .env.local or .env in {}", cwd.display()),
    }
}
