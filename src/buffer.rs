//! Encoded frame buffer for DotStar (APA102) LED strips.
//!
//! This module keeps two views of the strip in one owned object: the logical
//! colors as the caller wrote them, and the transmit-ready byte buffer the
//! wire protocol wants. Every mutation re-encodes the affected LED frames, so
//! the byte buffer is always complete and a transport can send it at any
//! moment without further work.
//!
//! # Buffer layout
//!
//! ```text
//! +----------------+------------------------------+------------------+
//! | start frame    | LED frames                   | trailer          |
//! | 4 x 0x00       | N x [header, c0, c1, c2]     | ceil(N/16) x 0x00|
//! +----------------+------------------------------+------------------+
//! ```
//!
//! The header byte of each LED frame carries `0b111` in its top bits and a
//! 5-bit hardware brightness level in its low bits. The three color bytes are
//! permuted according to the strip's [`ColorOrder`].
//!
//! # Brightness policy
//!
//! The global brightness scale is applied **eagerly**: changing it re-encodes
//! every LED frame from the stored logical colors. Getters always return the
//! unscaled logical color, so scaling never degrades what a round-trip reads
//! back.
//!
//! # Example
//! ```rust
//! use dotstar_strip::buffer::FrameBuffer;
//! use dotstar_strip::{buffer_size, Color, ColorOrder};
//!
//! const N: usize = 8;
//! const BUF: usize = buffer_size(N);
//!
//! let mut pixels = FrameBuffer::<N, BUF>::new(ColorOrder::Bgr, 0.5).unwrap();
//! pixels.set(3, Color::new(255, 0, 64)).unwrap();
//!
//! // Reads are unscaled, the encoded bytes are not.
//! assert_eq!(pixels.get(3).unwrap(), Color::new(255, 0, 64));
//! assert_eq!(pixels.as_bytes()[4 + 4 * 3 + 3], 127);
//! ```

use bitfield::bitfield;
use embedded_dma::ReadBuffer;

use crate::{buffer_size, Color, ColorOrder, Error, LED_FRAME_SIZE, START_FRAME_SIZE};

bitfield! {
    /// Header byte of one LED frame.
    ///
    /// The bit layout is as follows:
    /// - Bits 7-5: Marker, always `0b111`
    /// - Bits 4-0: Hardware PWM brightness level
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    struct LedHeader(u8);
    impl Debug;
    pub marker, set_marker: 7, 5;
    pub level, set_level: 4, 0;
}

/// Full hardware brightness, the level every pixel starts at.
const LEVEL_MAX: u8 = 0x1F;

impl LedHeader {
    fn with_level(level: u8) -> Self {
        let mut header = Self(0);
        header.set_marker(0b111);
        header.set_level(level);
        header
    }
}

/// Quantizes a brightness fraction to the 5-bit hardware level.
///
/// Rounds up so that any non-zero fraction keeps the pixel lit.
fn quantize_level(level: f32) -> u8 {
    let clamped = level.clamp(0.0, 1.0);
    (libm::ceilf(clamped * 31.0) as u8) & LEVEL_MAX
}

/// Scales one color channel by the global brightness.
fn scale_channel(value: u8, scale: f32) -> u8 {
    (f32::from(value) * scale) as u8
}

/// Owned pixel state and encoded transmit buffer for an `N`-pixel strip.
///
/// # Type Parameters
/// - `N`: Number of pixels in the strip
/// - `BUF`: Encoded buffer length; must equal [`buffer_size`]`(N)`
///
/// # Helper Functions
/// Use [`buffer_size`] to compute `BUF`:
///
/// ```rust
/// use dotstar_strip::buffer::FrameBuffer;
/// use dotstar_strip::{buffer_size, ColorOrder};
///
/// const N: usize = 144;
/// const BUF: usize = buffer_size(N);
///
/// let pixels = FrameBuffer::<N, BUF>::new(ColorOrder::default(), 1.0).unwrap();
/// assert_eq!(pixels.len(), 144);
/// ```
#[derive(Clone)]
pub struct FrameBuffer<const N: usize, const BUF: usize> {
    colors: [Color; N],
    data: [u8; BUF],
    order: ColorOrder,
    scale: f32,
    dirty: bool,
}

impl<const N: usize, const BUF: usize> FrameBuffer<N, BUF> {
    /// Create a frame buffer with all pixels off.
    ///
    /// The start frame and trailer are written once here and never change.
    /// Every LED frame starts at full hardware brightness with zero color
    /// bytes, so a freshly constructed buffer transmits as a dark strip.
    ///
    /// `brightness` is clamped to `[0.0, 1.0]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSize`] if `BUF` does not equal
    /// [`buffer_size`]`(N)`.
    pub fn new(order: ColorOrder, brightness: f32) -> Result<Self, Error> {
        let expected = buffer_size(N);
        if BUF != expected {
            return Err(Error::BufferSize { expected, got: BUF });
        }
        let mut data = [0_u8; BUF];
        for frame in 0..N {
            data[START_FRAME_SIZE + LED_FRAME_SIZE * frame] = LedHeader::with_level(LEVEL_MAX).0;
        }
        Ok(Self {
            colors: [Color::new(0, 0, 0); N],
            data,
            order,
            scale: brightness.clamp(0.0, 1.0),
            dirty: false,
        })
    }

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

    /// Color order the strip was constructed with.
    #[must_use]
    pub const fn order(&self) -> ColorOrder {
        self.order
    }

    /// The logical (unscaled) color of one pixel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index` is not below `N`.
    pub fn get(&self, index: usize) -> Result<Color, Error> {
        if index >= N {
            return Err(Error::OutOfBounds { index, len: N });
        }
        Ok(self.colors[index])
    }

    /// All logical colors, in strip order.
    ///
    /// Range reads are plain slice operations on the returned value.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.colors
    }

    /// Set one pixel and re-encode its LED frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index` is not below `N`.
    pub fn set(&mut self, index: usize, color: Color) -> Result<(), Error> {
        if index >= N {
            return Err(Error::OutOfBounds { index, len: N });
        }
        self.colors[index] = color;
        self.encode(index);
        self.dirty = true;
        Ok(())
    }

    /// Set one pixel together with its 5-bit hardware brightness level.
    ///
    /// `level` is a fraction in `[0.0, 1.0]`, quantized upward onto the 31
    /// hardware steps. The hardware PWM behind this field runs slowly enough
    /// to streak in persistence-of-vision use; prefer the global scale there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index` is not below `N`.
    pub fn set_with_brightness(
        &mut self,
        index: usize,
        color: Color,
        level: f32,
    ) -> Result<(), Error> {
        if index >= N {
            return Err(Error::OutOfBounds { index, len: N });
        }
        let offset = START_FRAME_SIZE + LED_FRAME_SIZE * index;
        self.data[offset] = LedHeader::with_level(quantize_level(level)).0;
        self.set(index, color)
    }

    /// Assign a run of pixels from a slice of colors.
    ///
    /// The range is validated in full before any pixel changes, so a failed
    /// call leaves the buffer exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the range reaches past the strip and
    /// [`Error::LengthMismatch`] if `colors` does not have one entry per
    /// selected pixel.
    pub fn set_range(
        &mut self,
        range: core::ops::Range<usize>,
        colors: &[Color],
    ) -> Result<(), Error> {
        if range.start > range.end || range.end > N {
            return Err(Error::OutOfBounds {
                index: range.end,
                len: N,
            });
        }
        if colors.len() != range.len() {
            return Err(Error::LengthMismatch {
                expected: range.len(),
                got: colors.len(),
            });
        }
        for (index, color) in range.zip(colors.iter().copied()) {
            self.colors[index] = color;
            self.encode(index);
        }
        self.dirty = true;
        Ok(())
    }

    /// Set every pixel to the same color in one pass.
    pub fn fill(&mut self, color: Color) {
        for index in 0..N {
            self.colors[index] = color;
            self.encode(index);
        }
        self.dirty = true;
    }

    /// Turn every pixel off and reset hardware brightness to full.
    ///
    /// Used during teardown so the strip goes dark instead of holding its
    /// last frame.
    pub fn blank(&mut self) {
        for index in 0..N {
            let offset = START_FRAME_SIZE + LED_FRAME_SIZE * index;
            self.data[offset] = LedHeader::with_level(LEVEL_MAX).0;
        }
        self.fill(Color::new(0, 0, 0));
    }

    /// Current global brightness scale.
    #[must_use]
    pub const fn brightness(&self) -> f32 {
        self.scale
    }

    /// Change the global brightness scale and re-encode every LED frame.
    ///
    /// Out-of-range values are clamped to `[0.0, 1.0]` rather than rejected.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.scale = brightness.clamp(0.0, 1.0);
        for index in 0..N {
            self.encode(index);
        }
        self.dirty = true;
    }

    /// Whether the buffer changed since it was last transmitted.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that the current contents reached the strip.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// The complete encoded buffer: start frame, LED frames, trailer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Re-encode the color bytes of one LED frame from the logical color.
    fn encode(&mut self, index: usize) {
        let offset = START_FRAME_SIZE + LED_FRAME_SIZE * index;
        let [red, green, blue] = self.order.offsets();
        let color = self.colors[index];
        self.data[offset + 1 + red] = scale_channel(color.r, self.scale);
        self.data[offset + 1 + green] = scale_channel(color.g, self.scale);
        self.data[offset + 1 + blue] = scale_channel(color.b, self.scale);
    }
}

unsafe impl<const N: usize, const BUF: usize> ReadBuffer for FrameBuffer<N, BUF> {
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        (self.data.as_ptr(), BUF)
    }
}

unsafe impl<const N: usize, const BUF: usize> ReadBuffer for &mut FrameBuffer<N, BUF> {
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        (self.data.as_ptr(), BUF)
    }
}

impl<const N: usize, const BUF: usize> core::fmt::Debug for FrameBuffer<N, BUF> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("pixels", &N)
            .field("bytes", &BUF)
            .field("order", &self.order)
            .field("brightness", &self.scale)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize, const BUF: usize> defmt::Format for FrameBuffer<N, BUF> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "FrameBuffer {{ pixels: {}, bytes: {}, brightness: {}, dirty: {} }}",
            N,
            BUF,
            self.scale,
            self.dirty
        );
    }
}
