use avr_device::atmega328p::TC2;

use crate::config::TICK_PRESCALER;

// TCCR2B clock-select values
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum Prescaler {
    Div32 = 0x03,
    Div64 = 0x04,
}

impl Prescaler {
    pub const fn from_divisor(divisor: u32) -> Self {
        match divisor {
            32 => Prescaler::Div32,
            64 => Prescaler::Div64,
            _ => panic!("unsupported tick prescaler"),
        }
    }
}

/// Timer2 overflow interrupt as the scheduler tick source.
///
/// Fast PWM mode leaves the compare outputs usable for PWM while the
/// overflow fires every 256 timer clocks.
pub struct TickTimer {
    tc2: TC2,
}

impl TickTimer {
    pub fn new(tc2: TC2) -> Self {
        Self { tc2 }
    }

    /// Configure the prescaler and enable the overflow interrupt. The ISR
    /// must call `Scheduler::tick`.
    pub fn start(&mut self) {
        const PRESCALER: Prescaler = Prescaler::from_divisor(TICK_PRESCALER);

        critical_section::with(|_| {
            let tc2 = &self.tc2;
            // Fast PWM mode
            tc2.tccr2a.modify(|r, w| unsafe { w.bits(r.bits() | 0x03) });
            tc2.tccr2b
                .modify(|r, w| unsafe { w.bits((r.bits() & 0xC0) | PRESCALER as u8) });
            // Overflow interrupt, internal clock
            tc2.timsk2.write(|w| unsafe { w.bits(0x01) });
            tc2.assr.write(|w| unsafe { w.bits(0) });
        });
        log::debug!("tick timer started, prescaler {}", TICK_PRESCALER);
    }

    pub fn stop(&mut self) {
        self.tc2.timsk2.write(|w| unsafe { w.bits(0) });
    }
}
