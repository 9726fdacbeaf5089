use core::cell::RefCell;
use core::convert::Infallible;
use core::fmt;

use critical_section::Mutex;
use log::{LevelFilter, Log, Metadata, Record};

use crate::hal::Uart;

// Shared by task output and the logger; may be used from the tick ISR
static CONSOLE_UART: Mutex<RefCell<Option<Uart>>> = Mutex::new(RefCell::new(None));

/// Hand the UART to the console. Output before this call is dropped.
pub fn install(uart: Uart) {
    critical_section::with(|cs| {
        CONSOLE_UART.borrow(cs).replace(Some(uart));
    });
}

// One critical section per byte so a long line never holds off the tick
fn write_bytes(bytes: &[u8]) {
    for &byte in bytes {
        critical_section::with(|cs| {
            if let Some(uart) = CONSOLE_UART.borrow_ref_mut(cs).as_mut() {
                nb::block!(uart.write_byte(byte)).ok();
            }
        });
    }
}

/// Text output over USART0
#[derive(Default)]
pub struct SerialConsole;

impl SerialConsole {
    pub fn new() -> Self {
        Self
    }

    pub fn write_str(&mut self, s: &str) {
        write_bytes(s.as_bytes());
    }

    pub fn write_line(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }
}

impl ufmt::uWrite for SerialConsole {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        write_bytes(s.as_bytes());
        Ok(())
    }
}

impl fmt::Write for SerialConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        write_bytes(s.as_bytes());
        Ok(())
    }
}

/// `log` backend printing `[LEVEL] message` lines on the console
pub struct SerialLogger {
    level: LevelFilter,
}

impl SerialLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Install as the global logger.
    ///
    /// # Safety
    ///
    /// Must run once, before interrupts are enabled; AVR has no atomic
    /// compare-and-swap for the checked `log::set_logger`.
    pub unsafe fn install(&'static self) {
        if log::set_logger_racy(self).is_ok() {
            log::set_max_level_racy(self.level);
        }
    }
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut console = SerialConsole;
        fmt::Write::write_fmt(
            &mut console,
            format_args!("[{}] {}\r\n", record.level(), record.args()),
        )
        .ok();
    }

    fn flush(&self) {}
}
