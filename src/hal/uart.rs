use core::convert::Infallible;

use avr_device::atmega328p::USART0;

use crate::config::CPU_FREQ_HZ;

const UDRE0: u8 = 1 << 5;
const TXEN0: u8 = 1 << 3;
// 8 data bits, no parity, 1 stop bit
const FRAME_8N1: u8 = 0x06;

/// Polled USART0 transmitter
pub struct Uart {
    usart: USART0,
}

impl Uart {
    pub fn new(usart: USART0, baud: u32) -> Self {
        let ubrr = (CPU_FREQ_HZ / (16 * baud) - 1) as u16;
        usart.ubrr0.write(|w| unsafe { w.bits(ubrr) });
        usart.ucsr0c.write(|w| unsafe { w.bits(FRAME_8N1) });
        usart.ucsr0b.write(|w| unsafe { w.bits(TXEN0) });
        Self { usart }
    }

    /// Queue one byte, or `WouldBlock` while the data register is still full
    pub fn write_byte(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        if self.usart.ucsr0a.read().bits() & UDRE0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.usart.udr0.write(|w| unsafe { w.bits(byte) });
        Ok(())
    }
}
