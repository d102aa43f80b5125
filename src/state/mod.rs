//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunPhase`: the run state machine (seeding, draining, and the three terminal phases)
//! - `RunState`: the current phase with validated transitions
//! - `VisitRecord`: one fetch attempt, in fetch order

mod run_state;
mod visit;

// Re-export main types
pub use run_state::{RunPhase, RunState};
pub use visit::{VisitOutcome, VisitRecord};
