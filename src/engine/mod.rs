//! Core engine: the scan, rank, risk-gate and execute loop.

pub mod executor;
pub mod selection;
pub mod supervisor;

pub use executor::{Executor, PlanExecutor};
pub use selection::{execute_first_viable, rank_plans, Selection};
pub use supervisor::{CycleReport, LoopPhase, StepOutcome, Supervisor, SupervisorConfig};
