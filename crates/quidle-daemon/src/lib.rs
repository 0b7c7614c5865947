pub mod runtime;
pub mod scheduler;
pub mod sweeper;
pub mod viewer;

pub use runtime::Runtime;
pub use scheduler::run_alarm;
pub use sweeper::{SweepOutcome, Sweeper};
pub use viewer::{Overview, ReopenOutcome, Viewer};
