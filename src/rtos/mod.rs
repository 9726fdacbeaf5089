//! Cooperative scheduler: task lists, tick handling and the run loop

use core::fmt;

pub mod scheduler;
pub mod table;
pub mod task;
pub mod tick;

pub use scheduler::{Runner, Scheduler};
pub use table::{Inconsistency, List, TaskTable};
pub use task::{Quantum, SimpleTask, Task, TaskFunc, TaskId, TaskState, Ticks};
pub use tick::{millis_to_ticks, TICKS_PER_SECOND};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Every task slot is already registered
    TaskTableFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TaskTableFull => f.write_str("task table full"),
        }
    }
}
