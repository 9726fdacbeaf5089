pub mod gpio;
pub mod timer;
pub mod uart;

// Re-export commonly used types
pub use gpio::{board, Pin};
pub use timer::{Prescaler, TickTimer};
pub use uart::Uart;
