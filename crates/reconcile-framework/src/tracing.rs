//! # Observability & Tracing
//!
//! Structured logging for the engine and every resource handler.
//!
//! Each invocation runs inside an `Orchestrator::handle` span carrying `resource_type`,
//! `operation` and the request `token`, so every step log below it is attributed to one logical
//! operation.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Phase transitions and outcomes
//! RUST_LOG=info cargo run
//!
//! # Provider requests, status checks and skipped steps
//! RUST_LOG=debug cargo run
//!
//! # Only the step executor
//! RUST_LOG=reconcile_framework::step=debug cargo run
//! ```
//!
//! ## Levels
//!
//! - `debug` - request payloads, stabilization checks, steps skipped by the idempotency gate
//! - `info` - invocation outcomes, provider calls that went through, resources that stabilized
//! - `warn` - classified failures, retries, soft tagging failures

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once at startup; a second call panics because the global subscriber is already set.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
