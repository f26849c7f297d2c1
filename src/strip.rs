//! Strip driver tying a frame buffer to a transport.
//!
//! [`DotStar`] owns one [`FrameBuffer`] and one [`Transport`] and exposes the
//! driver surface callers expect from an addressable strip: indexed get/set,
//! range assignment, fill, global and per-pixel brightness, explicit `show`,
//! and a consuming `deinit` that darkens the strip and hands the bus or pins
//! back. It also implements [`SmartLedsWrite`], so anything that renders into
//! a `smart-leds` sink can drive a DotStar strip unchanged.
//!
//! With `auto_write` enabled (the default) every mutation transmits the
//! buffer once it is consistent again — one transmission per call, never one
//! per pixel.
//!
//! # Example
//! ```rust
//! # use core::convert::Infallible;
//! # use embedded_hal::digital::OutputPin;
//! # struct Pin;
//! # impl embedded_hal::digital::ErrorType for Pin { type Error = Infallible; }
//! # impl OutputPin for Pin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! use dotstar_strip::strip::{BitBangDotStar, StripConfig};
//! use dotstar_strip::{buffer_size, hex};
//!
//! const N: usize = 30;
//! const BUF: usize = buffer_size(N);
//!
//! let clock = Pin;
//! let data = Pin;
//! let mut strip =
//!     BitBangDotStar::<_, _, N, BUF>::bit_bang(clock, data, StripConfig::default())?;
//!
//! strip.set(0, hex(0x100000))?;
//! strip.fill(hex(0x000800))?;
//!
//! // Tear down: blank the strip and get the pins back.
//! let _pins = strip.deinit();
//! # Ok::<(), dotstar_strip::Error>(())
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use smart_leds::SmartLedsWrite;

use crate::buffer::FrameBuffer;
use crate::transport::{NoPin, NoSpi, Transport};
use crate::{Color, ColorOrder, Error};

/// Construction-time strip settings.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StripConfig {
    /// Channel order the strip hardware expects.
    pub order: ColorOrder,
    /// Initial global brightness scale, clamped to `[0.0, 1.0]`.
    pub brightness: f32,
    /// Transmit automatically after every mutation.
    pub auto_write: bool,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            order: ColorOrder::default(),
            brightness: 1.0,
            auto_write: true,
        }
    }
}

/// Driver for a DotStar (APA102) strip of `N` pixels.
///
/// # Type Parameters
/// - `SPI`: Hardware bus type, or [`NoSpi`] for bit-banged strips
/// - `CLK`, `DAT`: Output line types, or [`NoPin`] for SPI strips
/// - `N`: Number of pixels
/// - `BUF`: Encoded buffer length, computed with [`crate::buffer_size`]
///
/// The [`SpiDotStar`] and [`BitBangDotStar`] aliases fill in the placeholder
/// parameters for the backend not in use.
pub struct DotStar<SPI, CLK, DAT, const N: usize, const BUF: usize> {
    pixels: FrameBuffer<N, BUF>,
    transport: Transport<SPI, CLK, DAT>,
    auto_write: bool,
}

/// A strip driven by a hardware SPI bus.
pub type SpiDotStar<SPI, const N: usize, const BUF: usize> = DotStar<SPI, NoPin, NoPin, N, BUF>;

/// A strip driven by two software-toggled lines.
pub type BitBangDotStar<CLK, DAT, const N: usize, const BUF: usize> =
    DotStar<NoSpi, CLK, DAT, N, BUF>;

impl<SPI, const N: usize, const BUF: usize> SpiDotStar<SPI, N, BUF>
where
    SPI: SpiBus,
{
    /// Build a strip on a hardware SPI bus.
    ///
    /// The bus should be configured for SPI mode 0; the clock rate is
    /// whatever the bus was set up with (the strip tolerates anything up to
    /// the LED controllers' maximum).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSize`] if `BUF` does not match the strip
    /// length.
    pub fn with_spi(spi: SPI, config: StripConfig) -> Result<Self, Error> {
        Ok(Self {
            pixels: FrameBuffer::new(config.order, config.brightness)?,
            transport: Transport::spi(spi),
            auto_write: config.auto_write,
        })
    }
}

impl<CLK, DAT, const N: usize, const BUF: usize> BitBangDotStar<CLK, DAT, N, BUF>
where
    CLK: OutputPin,
    DAT: OutputPin,
{
    /// Build a strip on two output lines.
    ///
    /// Use this when no SPI peripheral is available for the pins the strip
    /// is wired to. The clock line is driven low immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSize`] if `BUF` does not match the strip
    /// length, or [`Error::Transport`] if the clock line cannot be driven.
    pub fn bit_bang(clock: CLK, data: DAT, config: StripConfig) -> Result<Self, Error> {
        Ok(Self {
            pixels: FrameBuffer::new(config.order, config.brightness)?,
            transport: Transport::bit_bang(clock, data)?,
            auto_write: config.auto_write,
        })
    }
}

impl<SPI, CLK, DAT, const N: usize, const BUF: usize> DotStar<SPI, CLK, DAT, N, BUF>
where
    SPI: SpiBus,
    CLK: OutputPin,
    DAT: OutputPin,
{
    /// Number of pixels in the strip.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns `true` for a zero-length strip.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// The logical (unscaled) color of one pixel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index` is not below the strip
    /// length.
    pub fn get(&self, index: usize) -> Result<Color, Error> {
        self.pixels.get(index)
    }

    /// All logical colors, in strip order.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        self.pixels.pixels()
    }

    /// Set one pixel.
    ///
    /// Accepts anything convertible to [`Color`]: an `RGB8`, an `(r, g, b)`
    /// tuple, or a [`crate::hex`] value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] on a bad index, or
    /// [`Error::Transport`] if auto-write transmission fails.
    pub fn set(&mut self, index: usize, color: impl Into<Color>) -> Result<(), Error> {
        self.pixels.set(index, color.into())?;
        self.maybe_show()
    }

    /// Set one pixel together with its 5-bit hardware brightness level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] on a bad index, or
    /// [`Error::Transport`] if auto-write transmission fails.
    pub fn set_with_brightness(
        &mut self,
        index: usize,
        color: impl Into<Color>,
        level: f32,
    ) -> Result<(), Error> {
        self.pixels.set_with_brightness(index, color.into(), level)?;
        self.maybe_show()
    }

    /// Assign a run of pixels from a slice of colors, transmitting once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] or [`Error::LengthMismatch`] without
    /// touching the strip, or [`Error::Transport`] if auto-write
    /// transmission fails.
    pub fn set_range(
        &mut self,
        range: core::ops::Range<usize>,
        colors: &[Color],
    ) -> Result<(), Error> {
        self.pixels.set_range(range, colors)?;
        self.maybe_show()
    }

    /// Set every pixel to the same color, transmitting once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if auto-write transmission fails.
    pub fn fill(&mut self, color: impl Into<Color>) -> Result<(), Error> {
        self.pixels.fill(color.into());
        self.maybe_show()
    }

    /// Current global brightness scale.
    #[must_use]
    pub const fn brightness(&self) -> f32 {
        self.pixels.brightness()
    }

    /// Change the global brightness scale, re-encoding every pixel.
    ///
    /// Out-of-range values are clamped, never rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if auto-write transmission fails.
    pub fn set_brightness(&mut self, brightness: f32) -> Result<(), Error> {
        self.pixels.set_brightness(brightness);
        self.maybe_show()
    }

    /// Whether the buffer changed since it last reached the strip.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.pixels.is_dirty()
    }

    /// Transmit the current buffer.
    ///
    /// With the SPI backend the colors may still be shifting out when this
    /// returns; with the bit-bang backend the strip has physically latched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the underlying write fails.
    pub fn show(&mut self) -> Result<(), Error> {
        self.transport.send(self.pixels.as_bytes())?;
        self.pixels.mark_clean();
        Ok(())
    }

    /// Blank the strip and release the transport.
    ///
    /// Every pixel is set to black at full hardware brightness and a final
    /// transmission is attempted so the strip visibly turns off; a transport
    /// failure at that point is ignored since teardown must complete either
    /// way. Consuming `self` means a deinitialized strip cannot be used
    /// again, and the returned [`Transport`] carries the bus or pins for
    /// reuse.
    pub fn deinit(mut self) -> Transport<SPI, CLK, DAT> {
        self.pixels.blank();
        let _ = self.transport.send(self.pixels.as_bytes());
        self.transport
    }

    fn maybe_show(&mut self) -> Result<(), Error> {
        if self.auto_write {
            self.show()
        } else {
            Ok(())
        }
    }
}

impl<SPI, CLK, DAT, const N: usize, const BUF: usize> SmartLedsWrite
    for DotStar<SPI, CLK, DAT, N, BUF>
where
    SPI: SpiBus,
    CLK: OutputPin,
    DAT: OutputPin,
{
    type Color = Color;
    type Error = Error;

    /// Fill the strip from an iterator and transmit once.
    ///
    /// Extra items beyond the strip length are dropped; if the iterator runs
    /// short, the remaining pixels keep their previous colors.
    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        for (index, color) in iterator.into_iter().take(N).enumerate() {
            self.pixels.set(index, color.into())?;
        }
        self.show()
    }
}
