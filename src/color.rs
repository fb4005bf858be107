//! Pixel colors and the 1D frame the pixel drivers store.

use core::ops::{Deref, DerefMut};
use embedded_graphics::prelude::RgbColor;

/// Predefined RGB color constants from the `smart_leds` crate.
#[doc(inline)]
pub use smart_leds::colors;

/// 8-bit-per-channel RGB color from `embedded_graphics`.
#[doc(inline)]
pub use embedded_graphics::pixelcolor::Rgb888;

/// RGB color stored per LED, re-exported from the `smart_leds` crate.
pub type Rgb = smart_leds::RGB8;

/// All channels off.
pub const BLACK: Rgb = Rgb::new(0, 0, 0);

/// Scale `color` toward black.
///
/// Each channel is multiplied by `(255 - ratio) / 255` with integer truncation, so a `ratio` of
/// 0 leaves the color unchanged and 255 yields black. Dimming is lossy: dimming twice and then
/// brightening cannot restore the original channels.
///
/// ```rust
/// use display_envoy::color::{dim, Rgb, BLACK};
///
/// let orange = Rgb::new(200, 100, 10);
/// assert_eq!(dim(orange, 0), orange);
/// assert_eq!(dim(orange, 255), BLACK);
/// assert_eq!(dim(orange, 128), Rgb::new(99, 49, 4));
/// ```
#[must_use]
pub const fn dim(color: Rgb, ratio: u8) -> Rgb {
    let keep = u8::MAX.saturating_sub(ratio);
    Rgb::new(
        scale_channel(color.r, keep),
        scale_channel(color.g, keep),
        scale_channel(color.b, keep),
    )
}

#[expect(
    clippy::arithmetic_side_effects,
    clippy::integer_division_remainder_used,
    clippy::cast_possible_truncation,
    reason = "u8 * u8 fits in u16 and the quotient is at most 255"
)]
const fn scale_channel(channel: u8, keep: u8) -> u8 {
    ((channel as u16 * keep as u16) / u8::MAX as u16) as u8
}

/// Convert colors to [`Rgb`] for LED strip rendering.
///
/// # Example
///
/// ```rust
/// use display_envoy::color::{Rgb, Rgb888, ToRgb};
///
/// let rgb = Rgb::new(16, 32, 48).to_rgb();
/// let converted = Rgb888::new(16, 32, 48).to_rgb();
///
/// assert_eq!(rgb, converted);
/// ```
pub trait ToRgb {
    /// Convert this color to [`Rgb`].
    #[must_use]
    fn to_rgb(self) -> Rgb;
}

impl ToRgb for Rgb {
    #[inline]
    fn to_rgb(self) -> Rgb {
        self
    }
}

impl ToRgb for Rgb888 {
    #[inline]
    fn to_rgb(self) -> Rgb {
        Rgb::new(self.r(), self.g(), self.b())
    }
}

/// Fixed-size 1D LED strip frame, indexed in physical wiring order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame1d<const N: usize>(pub [Rgb; N]);

impl<const N: usize> Frame1d<N> {
    /// Create a new blank (all black) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([BLACK; N])
    }
}

impl<const N: usize> Deref for Frame1d<N> {
    type Target = [Rgb; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for Frame1d<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> Default for Frame1d<N> {
    fn default() -> Self {
        Self::new()
    }
}
