//! Observability middleware.
//!
//! Installs the global tracing subscriber used by the error mapper and the
//! request trace layer, and routes panic reports through it.

use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;

use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use super::error_mapper::{panic_is_mapped, panic_message};
use crate::api::config::{ApiConfig, LogFormat};

/// Initialize tracing from the API configuration.
///
/// Invalid filter directives fall back to `info`. Output goes to stderr.
pub fn init_tracing(config: &ApiConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|e| {
        eprintln!("Invalid RUST_LOG '{}': {}. Using info.", config.log_filter, e);
        EnvFilter::new("info")
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .try_init()?,
    }

    Ok(())
}

/// Replace the default panic hook with one that logs through `tracing`.
///
/// Panics inside a request are caught by the error-mapping layer, which logs
/// them once as internal errors, so the hook stays silent for those.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        if !panic_is_mapped() {
            log_panic(info);
        }
    }));
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let location = info
        .location()
        .map(|location| location.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    error!(
        location = %location,
        backtrace = %Backtrace::capture(),
        "Panic: {}",
        panic_message(info.payload())
    );
}
