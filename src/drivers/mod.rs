pub mod serial_console;

pub use serial_console::{SerialConsole, SerialLogger};
