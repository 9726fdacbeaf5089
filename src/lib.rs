//! Cooperative, tick-driven task scheduler for single-core AVR parts.
//!
//! Tasks are registered once at start-up and never destroyed. Each one runs
//! a quantum to completion on the main loop and then asks to be requeued,
//! delayed for some ticks, or suspended until woken. A periodic timer
//! interrupt moves delayed tasks back onto the ready list.
#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod config;
pub mod rtos;

#[cfg(target_arch = "avr")]
pub mod drivers;
#[cfg(target_arch = "avr")]
pub mod hal;
