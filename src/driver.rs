//! The physical pixel driver seam and the power budget that caps LED brightness.
//!
//! [`PixelDriver`] is what [`LedMatrix`](crate::matrix::LedMatrix) writes through. It works in
//! strip order (plain indices) and knows nothing about panel geometry.
//!
//! [`StripDriver`] implements it for any [`SmartLedsWrite`] writer, so every WS2812 driver crate
//! built on `smart-leds` can sit behind a matrix.

use serde::{Deserialize, Serialize};
use smart_leds::SmartLedsWrite;

use crate::color::{BLACK, Frame1d, Rgb};
use crate::{Error, Result};

/// Physical LED strip driver as seen by the matrix.
///
/// Indices are strip positions in `0..self.len()`. Reads outside that range return black and
/// writes outside it are ignored.
pub trait PixelDriver {
    /// Number of LEDs the driver addresses.
    fn len(&self) -> usize;

    /// Whether the driver addresses no LEDs at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bring the strip up and push an initial frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverWrite`] if the initial frame cannot be written.
    fn begin(&mut self) -> Result<()>;

    /// Push the stored colors to the LEDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverWrite`] if the LED writer fails.
    fn show(&mut self) -> Result<()>;

    /// Whether the previous [`Self::show`] has finished, so another may start.
    fn is_ready(&self) -> bool;

    /// Store `color` for the LED at `index`.
    fn set_pixel_color(&mut self, index: usize, color: Rgb);

    /// Stored color of the LED at `index`.
    fn pixel_color(&self, index: usize) -> Rgb;

    /// Set the already power-scaled output brightness.
    fn set_brightness(&mut self, brightness: u8);

    /// Set every stored color to black.
    fn clear(&mut self);
}

/// Power budget for the LED supply.
///
/// Each WS2812 LED draws roughly 60 mA at full white. A supply that cannot feed every LED at
/// full white caps the brightness, see [`PowerBudget::scale_brightness`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Current {
    /// Supply can deliver at most this many milliamps.
    Milliamps(u16),
    /// No limit. Requested brightness passes through unchanged.
    Unlimited,
}

impl Default for Current {
    fn default() -> Self {
        MAX_CURRENT_DEFAULT
    }
}

/// Default supply budget (`Current::Milliamps(3500)`).
pub const MAX_CURRENT_DEFAULT: Current = Current::Milliamps(3500);

/// Default worst-case draw of one LED at full white, in milliamps.
pub const LED_CURRENT_DEFAULT_MA: u16 = 60;

/// Supply budget plus the per-LED worst case it is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerBudget {
    /// Maximum supply current.
    pub supply: Current,
    /// Current one LED draws at full white, in milliamps.
    pub per_led_ma: u16,
}

impl PowerBudget {
    /// Default budget: [`MAX_CURRENT_DEFAULT`] against [`LED_CURRENT_DEFAULT_MA`] per LED.
    pub const DEFAULT: Self = Self::new(MAX_CURRENT_DEFAULT, LED_CURRENT_DEFAULT_MA);

    /// Create a power budget.
    ///
    /// # Panics
    ///
    /// Panics if `per_led_ma` is zero.
    #[must_use]
    pub const fn new(supply: Current, per_led_ma: u16) -> Self {
        assert!(per_led_ma > 0, "per_led_ma must be positive");
        Self { supply, per_led_ma }
    }

    /// Hardware-safe output brightness for a logical `brightness` across `led_count` LEDs.
    ///
    /// Computes `(supply_ma * brightness) / (per_led_ma * led_count)` with integer
    /// truncation, saturating at 255. [`Current::Unlimited`] returns `brightness` unchanged.
    ///
    /// This is a proportional scale, not only a cap: when the supply exceeds the worst-case
    /// demand, the result is *brighter* than requested (up to 255). Only a logical 0 always
    /// maps to 0.
    ///
    /// ```rust
    /// use display_envoy::driver::{Current, PowerBudget};
    ///
    /// // 256 LEDs * 60 mA = 15.36 A worst case against a 3.5 A supply.
    /// let budget = PowerBudget::new(Current::Milliamps(3500), 60);
    /// assert_eq!(budget.scale_brightness(255, 256), 58);
    /// assert_eq!(budget.scale_brightness(0, 256), 0);
    ///
    /// // 8 LEDs need only 480 mA, so a dim request is scaled up.
    /// assert_eq!(budget.scale_brightness(10, 8), 72);
    /// ```
    #[must_use]
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::integer_division_remainder_used,
        clippy::cast_possible_truncation,
        reason = "operands are widened to u64 and the quotient is checked against u8::MAX"
    )]
    pub const fn scale_brightness(self, brightness: u8, led_count: usize) -> u8 {
        match self.supply {
            Current::Unlimited => brightness,
            Current::Milliamps(supply_ma) => {
                let worst_case_ma = self.per_led_ma as u64 * led_count as u64;
                if worst_case_ma == 0 {
                    return brightness;
                }
                let scaled = supply_ma as u64 * brightness as u64 / worst_case_ma;
                if scaled > u8::MAX as u64 {
                    u8::MAX
                } else {
                    scaled as u8
                }
            }
        }
    }
}

impl Default for PowerBudget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [`PixelDriver`] that buffers a [`Frame1d`] and pushes it through a `smart-leds` writer.
///
/// The writer is blocking, so the driver is ready again as soon as [`PixelDriver::show`]
/// returns. Brightness is applied on the way out with [`smart_leds::brightness`]; the stored
/// frame keeps the unscaled colors.
pub struct StripDriver<W, const N: usize> {
    writer: W,
    frame: Frame1d<N>,
    brightness: u8,
}

impl<W, const N: usize> StripDriver<W, N>
where
    W: SmartLedsWrite<Color = Rgb>,
{
    /// Wrap `writer`, starting from an all-black frame at full brightness.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            frame: Frame1d::new(),
            brightness: u8::MAX,
        }
    }

    /// Colors currently stored, in strip order.
    #[must_use]
    pub const fn frame(&self) -> &Frame1d<N> {
        &self.frame
    }

    /// Output brightness applied on [`PixelDriver::show`].
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// The wrapped writer.
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Give back the wrapped writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W, const N: usize> PixelDriver for StripDriver<W, N>
where
    W: SmartLedsWrite<Color = Rgb>,
{
    fn len(&self) -> usize {
        N
    }

    fn begin(&mut self) -> Result<()> {
        self.frame = Frame1d::new();
        self.show()
    }

    fn show(&mut self) -> Result<()> {
        self.writer
            .write(smart_leds::brightness(
                self.frame.iter().copied(),
                self.brightness,
            ))
            .map_err(|_| Error::DriverWrite)
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn set_pixel_color(&mut self, index: usize, color: Rgb) {
        if let Some(slot) = self.frame.get_mut(index) {
            *slot = color;
        }
    }

    fn pixel_color(&self, index: usize) -> Rgb {
        self.frame.get(index).copied().unwrap_or(BLACK)
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    fn clear(&mut self) {
        self.frame.fill(BLACK);
    }
}
