//! # RDS Reconciler
//!
//! > **Resumable provisioning of RDS resources.**
//!
//! Creating a cluster or a custom engine version takes minutes to hours, but each invocation of
//! a resource handler is short-lived. The engine does as much as it can per invocation, returns a
//! progress event, and is re-invoked later with the context it handed back. Nothing is kept in
//! memory in between.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`reconcile_framework`])
//! Generic and resource-agnostic: error classification, tag reconciliation, stabilization
//! polling, the step executor, the idempotency gate and the orchestrator.
//!
//! ### 2. The Resources ([`rds_handlers`])
//! Handlers for DB cluster parameter groups, custom DB engine versions and DB clusters, plus the
//! [`RdsSystem`](rds_handlers::lifecycle::RdsSystem) that serves them.
//!
//! ### 3. The Caller ([`driver`])
//! The re-invocation loop an external scheduler would run.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the demo against the in-memory service
//! RUST_LOG=info cargo run
//!
//! # Run every crate's tests
//! cargo test --workspace
//! ```

pub mod driver;

pub use driver::{drive, Completed, DriverError};
