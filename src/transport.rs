//! Transports that move an encoded buffer onto the strip's two wires.
//!
//! The strip does not care where its clock edges come from. Two backends
//! exist, chosen once when the transport is built and fixed for its lifetime:
//!
//! - **SPI** – a hardware [`SpiBus`] shifts the whole buffer out in one
//!   contiguous write (SCK wired to the strip's clock input, MOSI to data).
//!   The peripheral may still be shifting bits when the call returns; the
//!   contract is submission, not completion.
//! - **Bit-bang** – two [`OutputPin`]s toggled in software, for targets
//!   where no SPI peripheral is free or the strip sits on arbitrary pins.
//!   Strictly synchronous: the call returns only after the last clock edge.
//!
//! Exclusive ownership of the bus or pins is the acquisition protocol: a
//! transport consumes them at construction and hands them back when the strip
//! is torn down, so two owners of the same wires cannot coexist.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::Error;

/// Placeholder filling the SPI slot of a bit-banged strip.
///
/// Uninhabited, so it can never be constructed or sent through.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoSpi {}

impl embedded_hal::spi::ErrorType for NoSpi {
    type Error = core::convert::Infallible;
}

impl SpiBus for NoSpi {
    fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        match *self {}
    }

    fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        match *self {}
    }

    fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
        match *self {}
    }

    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        match *self {}
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

/// Placeholder filling the pin slots of an SPI-driven strip.
///
/// Uninhabited, so it can never be constructed or toggled.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoPin {}

impl embedded_hal::digital::ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

/// One of the two ways onto the wire, fixed at construction.
///
/// Every use site matches exhaustively on the variant, so a transport can
/// never be half-configured: it either owns a bus or it owns two pins.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport<SPI, CLK, DAT> {
    /// Hardware SPI bus, SCK as clock and MOSI as data.
    Spi(SPI),
    /// Two software-toggled output lines.
    BitBang {
        /// Clock line, idle-low.
        clock: CLK,
        /// Data line, sampled by the strip on the clock's rising edge.
        data: DAT,
    },
}

impl<SPI, CLK, DAT> Transport<SPI, CLK, DAT>
where
    SPI: SpiBus,
    CLK: OutputPin,
    DAT: OutputPin,
{
    /// Wrap a hardware SPI bus.
    ///
    /// The bus should already be configured for the desired clock rate; the
    /// rate is a recommendation to the hardware either way. Mode 0 (idle-low
    /// clock, sample on rising edge) is what the strip expects.
    pub fn spi(bus: SPI) -> Self {
        Transport::Spi(bus)
    }

    /// Claim two output lines for software transmission.
    ///
    /// The clock line is driven low immediately so the strip sees an idle
    /// bus rather than a spurious edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the clock line cannot be driven.
    pub fn bit_bang(mut clock: CLK, data: DAT) -> Result<Self, Error> {
        clock.set_low().map_err(|_| Error::Transport)?;
        Ok(Transport::BitBang { clock, data })
    }

    /// Send a complete encoded buffer to the strip.
    ///
    /// The SPI path submits one contiguous write and may return before the
    /// peripheral finishes shifting. The bit-bang path clocks every bit out
    /// MSB first and returns only when physically done, leaving the clock
    /// line low.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the underlying bus or pin write
    /// fails. Nothing is retried.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        match self {
            Transport::Spi(bus) => bus.write(bytes).map_err(|_| Error::Transport),
            Transport::BitBang { clock, data } => {
                for &byte in bytes {
                    for bit in (0..8).rev() {
                        if byte & (1 << bit) == 0 {
                            data.set_low().map_err(|_| Error::Transport)?;
                        } else {
                            data.set_high().map_err(|_| Error::Transport)?;
                        }
                        clock.set_high().map_err(|_| Error::Transport)?;
                        clock.set_low().map_err(|_| Error::Transport)?;
                    }
                }
                clock.set_low().map_err(|_| Error::Transport)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::cell::RefCell;
    use core::convert::Infallible;
    use std::rc::Rc;
    use std::vec::Vec;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Clock(bool),
        Data(bool),
    }

    struct RecordingPin {
        event: fn(bool) -> Event,
        log: Rc<RefCell<Vec<Event>>>,
    }

    impl embedded_hal::digital::ErrorType for RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.event)(false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.event)(true));
            Ok(())
        }
    }

    struct RecordingSpi {
        written: Vec<u8>,
        writes: usize,
    }

    impl embedded_hal::spi::ErrorType for RecordingSpi {
        type Error = Infallible;
    }

    impl SpiBus for RecordingSpi {
        fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
            words.fill(0);
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
            self.written.extend_from_slice(words);
            self.writes += 1;
            Ok(())
        }

        fn transfer(&mut self, read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
            read.fill(0);
            Ok(())
        }

        fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    type SoftTransport = Transport<NoSpi, RecordingPin, RecordingPin>;

    fn bit_bang_transport() -> (SoftTransport, Rc<RefCell<Vec<Event>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let clock = RecordingPin {
            event: Event::Clock,
            log: Rc::clone(&log),
        };
        let data = RecordingPin {
            event: Event::Data,
            log: Rc::clone(&log),
        };
        let transport = Transport::bit_bang(clock, data).unwrap();
        log.borrow_mut().clear();
        (transport, log)
    }

    #[test]
    fn test_bit_bang_claims_clock_low() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let clock = RecordingPin {
            event: Event::Clock,
            log: Rc::clone(&log),
        };
        let data = RecordingPin {
            event: Event::Data,
            log: Rc::clone(&log),
        };
        let _transport: SoftTransport = Transport::bit_bang(clock, data).unwrap();
        assert_eq!(&log.borrow()[..], &[Event::Clock(false)]);
    }

    #[test]
    fn test_bit_bang_bit_order() {
        let (mut transport, log) = bit_bang_transport();
        transport.send(&[0b1011_0000]).unwrap();

        let events = log.borrow();
        // Eight bits, MSB first, each: data value, clock rise, clock fall.
        let expected_bits = [true, false, true, true, false, false, false, false];
        for (bit, value) in expected_bits.iter().enumerate() {
            assert_eq!(events[bit * 3], Event::Data(*value), "bit {bit}");
            assert_eq!(events[bit * 3 + 1], Event::Clock(true), "bit {bit}");
            assert_eq!(events[bit * 3 + 2], Event::Clock(false), "bit {bit}");
        }
        // Final idle-low after the last byte.
        assert_eq!(*events.last().unwrap(), Event::Clock(false));
        assert_eq!(events.len(), 8 * 3 + 1);
    }

    #[test]
    fn test_bit_bang_multi_byte_length() {
        let (mut transport, log) = bit_bang_transport();
        transport.send(&[0x00, 0xFF, 0xA5]).unwrap();
        assert_eq!(log.borrow().len(), 3 * 8 * 3 + 1);
    }

    #[test]
    fn test_spi_single_contiguous_write() {
        let mut transport: Transport<RecordingSpi, NoPin, NoPin> = Transport::spi(RecordingSpi {
            written: Vec::new(),
            writes: 0,
        });

        let bytes = [0x00, 0x00, 0x00, 0x00, 0xFF, 0x01, 0x02, 0x03];
        transport.send(&bytes).unwrap();

        let Transport::Spi(bus) = transport else {
            unreachable!();
        };
        assert_eq!(bus.written, bytes);
        assert_eq!(bus.writes, 1);
    }
}
