//! LIBRIS application library
//!
//! Hosts the book catalog module and the bootstrap sequence shared by the
//! `libris-app` binary and the `libris` CLI.

#![recursion_limit = "256"]

use anyhow::Context;
use libris_kernel::{InitCtx, ModuleRegistry, Settings};

pub mod modules;

pub use modules::books;

/// Build a registry holding every application module.
pub fn build_registry() -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry).context("failed to register modules")?;
    Ok(registry)
}

/// Run the service until a shutdown signal arrives.
///
/// Modules are initialized and started before the listener binds, and
/// stopped after in-flight requests have drained.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry()?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served =
        libris_http::start_server(&registry, &settings, libris_http::shutdown_signal()).await;

    registry.stop_modules().await?;
    served
}
