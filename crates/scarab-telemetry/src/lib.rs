//! Outbound telemetry for the experiment page.
//!
//! Events flow through a [`TelemetryDispatcher`]: fire-and-forget in the
//! normal case, a bounded awaited flush for the final exit event. Delivery
//! failures are captured to a local diagnostic store for manual inspection
//! and are never retried or surfaced to the visitor.

mod collector;
mod diagnostics;
mod dispatcher;
mod simulated;

pub use collector::HttpCollector;
pub use diagnostics::DiagnosticStore;
pub use dispatcher::TelemetryDispatcher;
pub use simulated::SimulatedCollector;
