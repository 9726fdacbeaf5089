//! Task slot arena holding the ready list and the delta-encoded delay list.
//!
//! Every method here assumes the caller holds the scheduler's critical
//! section. Links are slot indices, so a task is "in" a list exactly when it
//! is reachable from that list's head.
//!
//! The delay list stores each node's countdown relative to its predecessor:
//!
//! ```text
//! delay_head -> [A: 3] -> [B: 0] -> [C: 4]
//!               wakes     wakes     wakes
//!               in 3      in 3      in 7
//! ```
//!
//! so a tick only ever touches the head.

use log::{error, trace};

use super::task::{Quantum, TaskId, TaskState, Ticks};

#[derive(Copy, Clone, Debug)]
struct Slot {
    state: TaskState,
    /// Delay-list delta relative to the previous node
    ticks_to_wakeup: Ticks,
    next: Option<TaskId>,
}

impl Slot {
    const IDLE: Self = Self {
        state: TaskState::Suspended,
        ticks_to_wakeup: 0,
        next: None,
    };
}

/// Which list a task was found in during an [`audit`](TaskTable::audit)
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum List {
    Ready,
    Delay,
}

/// A broken list invariant reported by [`TaskTable::audit`]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Inconsistency {
    /// The task's state tag doesn't match the list it is linked into
    StateMismatch {
        task: TaskId,
        state: TaskState,
        list: Option<List>,
    },
    /// The task is reachable twice (from one list or both)
    DuplicateLink(TaskId),
    /// The cached ready-list tail isn't the last node
    StaleReadyTail,
    /// The delay-list head has a zero countdown
    ExpiredDelayHead(TaskId),
    /// The running task isn't at the head of the ready list
    CurrentNotAtHead(TaskId),
}

#[derive(Debug)]
pub struct TaskTable<const N: usize> {
    slots: [Slot; N],
    ready_head: Option<TaskId>,
    ready_tail: Option<TaskId>,
    delay_head: Option<TaskId>,
    /// Task whose quantum is executing, if any
    current: Option<TaskId>,
    elapsed: Ticks,
}

impl<const N: usize> TaskTable<N> {
    pub const fn new() -> Self {
        Self {
            slots: [Slot::IDLE; N],
            ready_head: None,
            ready_tail: None,
            delay_head: None,
            current: None,
            elapsed: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn state(&self, id: TaskId) -> TaskState {
        self.slots[id.index()].state
    }

    /// Task whose quantum is currently executing
    #[inline]
    pub fn current(&self) -> Option<TaskId> {
        self.current
    }

    /// Ticks seen since the last reset (wrapping)
    #[inline]
    pub fn elapsed(&self) -> Ticks {
        self.elapsed
    }

    /// Ready list in run order
    pub fn ready(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.walk(self.ready_head)
    }

    /// Delay list in wake order, with each task's absolute remaining ticks
    pub fn delaying(&self) -> impl Iterator<Item = (TaskId, Ticks)> + '_ {
        let mut total: Ticks = 0;
        self.walk(self.delay_head).map(move |id| {
            total += self.slots[id.index()].ticks_to_wakeup;
            (id, total)
        })
    }

    fn walk(&self, head: Option<TaskId>) -> impl Iterator<Item = TaskId> + '_ {
        // Bounded so a corrupted cycle can't hang the caller
        core::iter::successors(head, move |id| self.slots[id.index()].next).take(N)
    }

    /// Wake a suspended task. Returns `false` (and does nothing) if the task
    /// is already ready or delaying.
    pub(crate) fn wake(&mut self, id: TaskId, sleep: Ticks) -> bool {
        let state = self.state(id);
        if state != TaskState::Suspended {
            trace!("wake {}: ignored, task is {:?}", id, state);
            return false;
        }
        self.rewake(id, sleep);
        true
    }

    fn rewake(&mut self, id: TaskId, sleep: Ticks) {
        if sleep == 0 {
            trace!("wake {}: ready", id);
            let slot = &mut self.slots[id.index()];
            slot.state = TaskState::Ready;
            slot.ticks_to_wakeup = 0;
            self.append_ready(id, id);
        } else {
            trace!("wake {}: delaying {} ticks", id, sleep);
            self.insert_delay(id, sleep);
        }
    }

    /// Splice the already-linked run `first..=last` onto the ready list tail
    fn append_ready(&mut self, first: TaskId, last: TaskId) {
        self.slots[last.index()].next = None;
        match self.ready_tail {
            Some(tail) => self.slots[tail.index()].next = Some(first),
            None => self.ready_head = Some(first),
        }
        self.ready_tail = Some(last);
    }

    fn insert_delay(&mut self, id: TaskId, sleep: Ticks) {
        let mut remaining = sleep;
        let mut prev = None;
        let mut cursor = self.delay_head;

        // Skip every node waking no later than us, so equal wake times keep
        // insertion order
        while let Some(node) = cursor {
            let delta = self.slots[node.index()].ticks_to_wakeup;
            if delta > remaining {
                self.slots[node.index()].ticks_to_wakeup = delta - remaining;
                break;
            }
            remaining -= delta;
            prev = Some(node);
            cursor = self.slots[node.index()].next;
        }

        let slot = &mut self.slots[id.index()];
        slot.state = TaskState::Delaying;
        slot.ticks_to_wakeup = remaining;
        slot.next = cursor;
        match prev {
            Some(prev) => self.slots[prev.index()].next = Some(id),
            None => self.delay_head = Some(id),
        }
    }

    /// Cancel any pending wakeup. Returns `false` if the task was already
    /// suspended or is the one currently executing.
    pub(crate) fn suspend(&mut self, id: TaskId) -> bool {
        match self.state(id) {
            TaskState::Suspended => false,
            TaskState::Ready if self.current == Some(id) => {
                trace!("suspend {}: ignored, task is running", id);
                false
            }
            TaskState::Ready => {
                self.unlink_ready(id);
                self.slots[id.index()].state = TaskState::Suspended;
                trace!("suspend {}: removed from ready list", id);
                true
            }
            TaskState::Delaying => {
                self.unlink_delay(id);
                self.slots[id.index()].state = TaskState::Suspended;
                trace!("suspend {}: removed from delay list", id);
                true
            }
        }
    }

    fn unlink_ready(&mut self, id: TaskId) {
        let prev = match self.find_prev(self.ready_head, id) {
            Some(prev) => prev,
            None => corrupted(id, "is marked ready but not in the ready list"),
        };
        let next = self.slots[id.index()].next.take();
        match prev {
            Some(prev) => self.slots[prev.index()].next = next,
            None => self.ready_head = next,
        }
        if self.ready_tail == Some(id) {
            self.ready_tail = prev;
        }
    }

    fn unlink_delay(&mut self, id: TaskId) {
        let prev = match self.find_prev(self.delay_head, id) {
            Some(prev) => prev,
            None => corrupted(id, "is marked delaying but not in the delay list"),
        };
        let slot = &mut self.slots[id.index()];
        let next = slot.next.take();
        let delta = core::mem::replace(&mut slot.ticks_to_wakeup, 0);
        match prev {
            Some(prev) => self.slots[prev.index()].next = next,
            None => self.delay_head = next,
        }
        // Keep the successor's absolute wake time unchanged
        if let Some(next) = next {
            self.slots[next.index()].ticks_to_wakeup += delta;
        }
    }

    /// Locate `id` in the list starting at `head`. `Some(None)` means it is
    /// the head, `None` means it isn't linked at all.
    fn find_prev(&self, head: Option<TaskId>, id: TaskId) -> Option<Option<TaskId>> {
        let mut prev = None;
        for node in self.walk(head) {
            if node == id {
                return Some(prev);
            }
            prev = Some(node);
        }
        None
    }

    /// Suspend every task except the running one, dropping all pending
    /// wakeups.
    pub(crate) fn suspend_others(&mut self) {
        let keep = self.current;
        let mut dropped = 0usize;

        for head in [self.delay_head.take(), self.ready_head.take()] {
            let mut cursor = head;
            while let Some(id) = cursor {
                let slot = &mut self.slots[id.index()];
                cursor = slot.next.take();
                if Some(id) != keep {
                    slot.state = TaskState::Suspended;
                    slot.ticks_to_wakeup = 0;
                    dropped += 1;
                }
            }
        }

        self.ready_head = keep;
        self.ready_tail = keep;
        log::debug!("suspend_others: {} tasks suspended", dropped);
    }

    /// Mark the ready-list head as running and return it
    pub(crate) fn begin_quantum(&mut self) -> Option<TaskId> {
        self.current = self.ready_head;
        self.current
    }

    /// Detach the task that just ran from the ready-list head and reschedule
    /// it according to its quantum result.
    pub(crate) fn end_quantum(&mut self, id: TaskId, outcome: Quantum) {
        self.current = None;
        if self.ready_head != Some(id) {
            corrupted(id, "finished a quantum but is not at the head of the ready list");
        }

        // Suspended first so the re-wake below is always legal
        let slot = &mut self.slots[id.index()];
        slot.state = TaskState::Suspended;
        self.ready_head = slot.next.take();
        if self.ready_head.is_none() {
            self.ready_tail = None;
        }

        match outcome.sleep_ticks() {
            Some(sleep) => self.rewake(id, sleep),
            None => trace!("{} suspended itself", id),
        }
    }

    /// One timer tick
    #[inline]
    pub(crate) fn tick(&mut self) {
        self.advance(1);
    }

    /// Apply `ticks` timer ticks at once. Equivalent to calling
    /// [`tick`](Self::tick) that many times.
    pub(crate) fn advance(&mut self, ticks: Ticks) {
        self.elapsed = self.elapsed.wrapping_add(ticks);

        let mut remaining = ticks;
        while remaining > 0 {
            let head = match self.delay_head {
                Some(head) => head,
                None => break,
            };
            let slot = &mut self.slots[head.index()];
            let step = slot.ticks_to_wakeup.min(remaining);
            slot.ticks_to_wakeup -= step;
            remaining -= step;
            if slot.ticks_to_wakeup == 0 {
                self.expire_head();
            }
        }
    }

    /// Move the delay-list head, and every following node due in the same
    /// tick, to the ready list tail.
    fn expire_head(&mut self) {
        let first = match self.delay_head {
            Some(head) => head,
            None => return,
        };
        let mut last = first;
        self.slots[first.index()].state = TaskState::Ready;
        trace!("{} expired", first);

        while let Some(next) = self.slots[last.index()].next {
            let slot = &mut self.slots[next.index()];
            if slot.ticks_to_wakeup != 0 {
                break;
            }
            slot.state = TaskState::Ready;
            trace!("{} expired", next);
            last = next;
        }

        self.delay_head = self.slots[last.index()].next;
        self.append_ready(first, last);
    }

    /// Check every list invariant. Intended for tests and debugging; cost is
    /// O(N).
    pub fn audit(&self) -> Result<(), Inconsistency> {
        let mut seen: [Option<List>; N] = [None; N];

        let mut last = None;
        for id in self.walk(self.ready_head) {
            self.audit_member(&mut seen, id, List::Ready, TaskState::Ready)?;
            last = Some(id);
        }
        if self.ready_tail != last {
            return Err(Inconsistency::StaleReadyTail);
        }

        for id in self.walk(self.delay_head) {
            self.audit_member(&mut seen, id, List::Delay, TaskState::Delaying)?;
        }
        if let Some(head) = self.delay_head {
            if self.slots[head.index()].ticks_to_wakeup == 0 {
                return Err(Inconsistency::ExpiredDelayHead(head));
            }
        }

        for (index, (slot, list)) in self.slots.iter().zip(seen.iter()).enumerate() {
            if list.is_none() && slot.state != TaskState::Suspended {
                return Err(Inconsistency::StateMismatch {
                    task: TaskId::new(index),
                    state: slot.state,
                    list: None,
                });
            }
        }

        match self.current {
            Some(current) if self.ready_head != Some(current) => {
                Err(Inconsistency::CurrentNotAtHead(current))
            }
            _ => Ok(()),
        }
    }

    fn audit_member(
        &self,
        seen: &mut [Option<List>; N],
        id: TaskId,
        list: List,
        expected: TaskState,
    ) -> Result<(), Inconsistency> {
        if seen[id.index()].replace(list).is_some() {
            return Err(Inconsistency::DuplicateLink(id));
        }
        let state = self.state(id);
        if state != expected {
            return Err(Inconsistency::StateMismatch {
                task: id,
                state,
                list: Some(list),
            });
        }
        Ok(())
    }
}

impl<const N: usize> Default for TaskTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cold]
fn corrupted(id: TaskId, what: &str) -> ! {
    error!("scheduler lists corrupted: {} {}", id, what);
    panic!("scheduler lists corrupted: {} {}", id, what);
}
