//! Application tasks driven by the scheduler

use embedded_hal::digital::v2::OutputPin;

use crate::rtos::{millis_to_ticks, Quantum, Task, Ticks};

/// Toggles an LED pin, sleeping half a period between edges
pub struct Blinker<P> {
    pin: P,
    lit: bool,
    half_period: Ticks,
}

impl<P: OutputPin> Blinker<P> {
    pub fn new(pin: P, period_ms: u32) -> Self {
        Self {
            pin,
            lit: false,
            half_period: millis_to_ticks(period_ms / 2).max(1),
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Task for Blinker<P> {
    fn run_quantum(&mut self) -> Quantum {
        self.lit = !self.lit;
        let result = if self.lit {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => Quantum::SleepFor(self.half_period),
            Err(_) => {
                log::warn!("blinker: pin write failed, stopping");
                Quantum::Suspend
            }
        }
    }
}
