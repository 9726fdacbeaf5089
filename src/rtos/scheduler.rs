//! Cooperative tick-driven task scheduler
//!
//! [`Scheduler`] owns the task lists and is shared between the main loop,
//! task bodies and the tick interrupt, so it lives in a `static`. Every list
//! operation runs inside a critical section with interrupts masked.
//! [`Runner`] owns the task bodies and is driven only from the main loop.

use core::cell::RefCell;

use critical_section::Mutex;
use log::debug;

use super::table::TaskTable;
use super::task::{Task, TaskId, TaskState, Ticks};
use super::Error;

pub struct Scheduler<const N: usize> {
    table: Mutex<RefCell<TaskTable<N>>>,
}

impl<const N: usize> Scheduler<N> {
    /// Create a scheduler with empty lists, suitable for a `static`
    pub const fn new() -> Self {
        Self {
            table: Mutex::new(RefCell::new(TaskTable::new())),
        }
    }

    /// Reset both lists and the logical clock. Call once at start-up before
    /// enabling the tick source; every task slot becomes suspended.
    pub fn init(&self) {
        self.with(|table| table.reset());
        debug!("scheduler: {} task slots", N);
    }

    #[inline]
    fn with<R>(&self, f: impl FnOnce(&mut TaskTable<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.table.borrow_ref_mut(cs)))
    }

    /// Wake a suspended task, either onto the ready list (`sleep == 0`) or
    /// onto the delay list. Safe to call from an ISR. Returns `false` if the
    /// task was not suspended, in which case nothing changes.
    pub fn wake(&self, id: TaskId, sleep: Ticks) -> bool {
        self.with(|table| table.wake(id, sleep))
    }

    /// Cancel a task's pending wakeup. Ignored for an already suspended task
    /// and for the task whose quantum is executing.
    pub fn suspend(&self, id: TaskId) -> bool {
        self.with(|table| table.suspend(id))
    }

    /// Suspend every task except the one currently running
    pub fn suspend_others(&self) {
        self.with(|table| table.suspend_others())
    }

    pub fn state(&self, id: TaskId) -> TaskState {
        self.with(|table| table.state(id))
    }

    #[inline]
    pub fn is_suspended(&self, id: TaskId) -> bool {
        self.state(id) == TaskState::Suspended
    }

    /// Ticks seen since [`init`](Self::init), wrapping
    pub fn ticks(&self) -> Ticks {
        self.with(|table| table.elapsed())
    }

    /// Tick-source hook, called from the timer ISR
    #[inline]
    pub fn tick(&self) {
        self.with(|table| table.tick())
    }

    /// Apply `ticks` timer ticks in one critical section
    pub fn advance(&self, ticks: Ticks) {
        self.with(|table| table.advance(ticks))
    }

    /// Run `f` against a consistent view of the task lists
    pub fn inspect<R>(&self, f: impl FnOnce(&TaskTable<N>) -> R) -> R {
        self.with(|table| f(table))
    }
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Main-loop side of the scheduler: owns the task bodies and runs them.
pub struct Runner<'a, const N: usize> {
    scheduler: &'a Scheduler<N>,
    tasks: [Option<&'a mut dyn Task>; N],
    task_count: usize,
}

impl<'a, const N: usize> Runner<'a, N> {
    pub fn new(scheduler: &'a Scheduler<N>) -> Self {
        Self {
            scheduler,
            tasks: core::array::from_fn(|_| None),
            task_count: 0,
        }
    }

    #[inline]
    pub fn scheduler(&self) -> &'a Scheduler<N> {
        self.scheduler
    }

    /// Register a task body. The task starts out suspended; wake it through
    /// the scheduler to start it.
    pub fn spawn(&mut self, task: &'a mut dyn Task) -> Result<TaskId, Error> {
        if self.task_count >= N {
            return Err(Error::TaskTableFull);
        }
        let id = TaskId::new(self.task_count);
        self.tasks[id.index()] = Some(task);
        self.task_count += 1;
        debug!("spawned {}", id);
        Ok(id)
    }

    /// Register a task body and wake it after `sleep` ticks
    pub fn spawn_started(&mut self, task: &'a mut dyn Task, sleep: Ticks) -> Result<TaskId, Error> {
        let id = self.spawn(task)?;
        self.scheduler.wake(id, sleep);
        Ok(id)
    }

    /// Run one quantum of the task at the head of the ready list. Returns
    /// `false` if nothing was ready.
    pub fn run_next(&mut self) -> bool {
        let id = match self.scheduler.with(|table| table.begin_quantum()) {
            Some(id) => id,
            None => return false,
        };

        // Body runs with interrupts enabled
        let outcome = match self.tasks[id.index()].as_mut() {
            Some(task) => task.run_quantum(),
            None => panic!("{} is scheduled but has no body", id),
        };

        self.scheduler.with(|table| table.end_quantum(id, outcome));
        true
    }

    /// Run tasks forever, calling `idle` whenever the ready list is empty
    pub fn run(&mut self, mut idle: impl FnMut()) -> ! {
        loop {
            if !self.run_next() {
                idle();
            }
        }
    }
}
