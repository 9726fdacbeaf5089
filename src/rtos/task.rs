//! Task identity, state and the quantum contract

use core::fmt;

/// Tick count used for delays and the logical clock
pub type Ticks = u32;

/// Handle to a registered task slot.
///
/// Handles are only minted by [`Runner::spawn`](super::Runner::spawn) and stay
/// valid for the lifetime of the program.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, ufmt::derive::uDebug)]
pub struct TaskId(u8);

impl TaskId {
    pub(crate) const fn new(index: usize) -> Self {
        assert!(index <= u8::MAX as usize);
        Self(index as u8)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ufmt::derive::uDebug)]
pub enum TaskState {
    /// Not linked into any list, no pending wakeup
    Suspended,
    /// Linked into the ready list
    Ready,
    /// Linked into the delay list
    Delaying,
}

/// What a task wants once its quantum returns
#[derive(Copy, Clone, PartialEq, Eq, Debug, ufmt::derive::uDebug)]
pub enum Quantum {
    /// Go to the back of the ready list
    Requeue,
    /// Sleep for the given number of ticks. `SleepFor(0)` is a requeue.
    SleepFor(Ticks),
    /// Stay suspended until another context wakes the task
    Suspend,
}

impl Quantum {
    /// Sleep time to re-wake with, or `None` to stay suspended
    #[inline]
    pub fn sleep_ticks(self) -> Option<Ticks> {
        match self {
            Quantum::Requeue => Some(0),
            Quantum::SleepFor(ticks) => Some(ticks),
            Quantum::Suspend => None,
        }
    }
}

/// Integer return convention: negative suspends, zero requeues, positive
/// sleeps for that many ticks.
impl From<i32> for Quantum {
    fn from(raw: i32) -> Self {
        match raw {
            r if r < 0 => Quantum::Suspend,
            0 => Quantum::Requeue,
            r => Quantum::SleepFor(r as Ticks),
        }
    }
}

/// The body of a cooperatively scheduled task.
///
/// A quantum runs to completion on the scheduler loop. It may be interrupted
/// by the tick ISR but never by another task.
pub trait Task {
    fn run_quantum(&mut self) -> Quantum;
}

/// Function signature for [`SimpleTask`] bodies
pub type TaskFunc = fn() -> Quantum;

/// A task whose body is a plain function (or closure) with no state of its
/// own beyond what the callback captures.
pub struct SimpleTask<F = TaskFunc> {
    func: F,
}

impl<F: FnMut() -> Quantum> SimpleTask<F> {
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F: FnMut() -> Quantum> Task for SimpleTask<F> {
    #[inline]
    fn run_quantum(&mut self) -> Quantum {
        (self.func)()
    }
}
