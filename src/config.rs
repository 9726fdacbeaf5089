//! Configuration constants for the scheduler firmware

/// CPU frequency in Hz, passed in by `build.rs` (`MCU_FREQ_HZ`)
pub const CPU_FREQ_HZ: u32 = parse_u32(env!("MCU_FREQ_HZ"));

/// Timer2 prescaler. 64 keeps the tick just over 1ms at 16MHz; slower parts
/// use 32 to land on the same rate.
pub const TICK_PRESCALER: u32 = if CPU_FREQ_HZ >= 10_000_000 { 64 } else { 32 };

/// Scheduler ticks per second (one tick per Timer2 overflow)
pub const TICKS_PER_SECOND: u32 = CPU_FREQ_HZ / (256 * TICK_PRESCALER);

/// Number of task slots in the firmware's scheduler
pub const MAX_TASKS: usize = 8;

/// UART baud rate
pub const UART_BAUD: u32 = 9600;

/// Blink period of the on-board LED task in milliseconds
pub const LED_PERIOD_MS: u32 = 1000;

/// Heartbeat message interval in milliseconds
pub const HEARTBEAT_MS: u32 = 5000;

const fn parse_u32(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        assert!(digit.is_ascii_digit(), "MCU_FREQ_HZ is not a decimal number");
        value = value * 10 + (digit - b'0') as u32;
        i += 1;
    }
    value
}
