//! Tick rate and time conversion

use super::task::Ticks;

/// Rate at which the tick source calls [`Scheduler::tick`](super::Scheduler::tick)
pub const TICKS_PER_SECOND: u32 = crate::config::TICKS_PER_SECOND;

/// Convert milliseconds to scheduler ticks, rounding up so a non-zero
/// delay never collapses into an immediate requeue.
pub const fn millis_to_ticks(ms: u32) -> Ticks {
    let ticks = (ms as u64 * TICKS_PER_SECOND as u64 + 999) / 1000;
    if ticks > Ticks::MAX as u64 {
        Ticks::MAX
    } else {
        ticks as Ticks
    }
}
