use avr_device::atmega328p::PORTB;
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::{OutputPin, ToggleableOutputPin};

/// Output pin on PORTB
#[derive(Debug)]
pub struct Pin<const P: u8> {
    _port: PhantomData<PORTB>,
}

impl<const P: u8> Pin<P> {
    /// Set the DDRB bit and drive the pin low
    pub fn into_output() -> Self {
        let port = Self::port();
        port.portb.modify(|r, w| unsafe { w.bits(r.bits() & !(1 << P)) });
        port.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | (1 << P)) });
        Pin { _port: PhantomData }
    }

    #[inline]
    fn port() -> &'static avr_device::atmega328p::portb::RegisterBlock {
        unsafe { &*PORTB::ptr() }
    }
}

impl<const P: u8> OutputPin for Pin<P> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        Self::port().portb.modify(|r, w| unsafe { w.bits(r.bits() | (1 << P)) });
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        Self::port().portb.modify(|r, w| unsafe { w.bits(r.bits() & !(1 << P)) });
        Ok(())
    }
}

impl<const P: u8> ToggleableOutputPin for Pin<P> {
    type Error = Infallible;

    #[inline]
    fn toggle(&mut self) -> Result<(), Infallible> {
        // Writing 1 to PINx toggles the output latch
        Self::port().pinb.write(|w| unsafe { w.bits(1 << P) });
        Ok(())
    }
}

// Arduino Uno board pins
pub mod board {
    use super::Pin;

    /// On-board LED (digital 13)
    pub type Led = Pin<5>;
}
