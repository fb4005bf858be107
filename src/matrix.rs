//! The LED matrix: logical `(x, y)` pixels on top of a strip-order [`PixelDriver`].
//!
//! [`LedMatrix`] owns exactly one [`TopologyMapper`] and one driver. Rendering code draws in
//! panel coordinates; the matrix maps each coordinate through the active topology and writes
//! the driver. It also implements the `embedded-graphics` [`DrawTarget`], so shapes and text
//! can be drawn straight onto the panel.
//!
//! # Example
//!
//! ```rust
//! use core::convert::Infallible;
//! use display_envoy::color::Rgb;
//! use display_envoy::driver::{PixelDriver, StripDriver};
//! use display_envoy::layout::Topology;
//! use display_envoy::matrix::{LedMatrix, MatrixConfig};
//!
//! # struct NullWriter;
//! # impl smart_leds::SmartLedsWrite for NullWriter {
//! #     type Error = Infallible;
//! #     type Color = Rgb;
//! #     fn write<T, I>(&mut self, _: T) -> Result<(), Infallible>
//! #     where T: IntoIterator<Item = I>, I: Into<Rgb> { Ok(()) }
//! # }
//! # fn example() -> display_envoy::Result<()> {
//! let config = MatrixConfig {
//!     width: 4,
//!     height: 2,
//!     topology: Topology::RowMajorAlternating,
//!     ..MatrixConfig::default()
//! };
//! let mut matrix = LedMatrix::new(config, StripDriver::<_, 8>::new(NullWriter))?;
//!
//! matrix.draw_pixel(0, 1, Rgb::new(255, 0, 0));
//! // Row 1 runs right to left, so (0, 1) is the last LED on the strip.
//! assert_eq!(matrix.driver().pixel_color(7), Rgb::new(255, 0, 0));
//!
//! // Off-panel writes are dropped rather than clamped onto an edge pixel.
//! matrix.draw_pixel(9, 1, Rgb::new(0, 255, 0));
//! assert_eq!(matrix.color(3, 1), Rgb::new(0, 0, 0));
//!
//! matrix.show()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use core::{cell::RefCell, convert::Infallible};

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embedded_graphics::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::Rgb888,
};
use serde::{Deserialize, Serialize};

use crate::color::{Rgb, ToRgb, dim};
use crate::driver::{PixelDriver, PowerBudget};
use crate::layout::{TOPOLOGY_DEFAULT, Topology, TopologyMapper};
use crate::{Error, Result};

/// Default matrix width in pixels (`32`).
pub const WIDTH_DEFAULT: u16 = 32;

/// Default matrix height in pixels (`8`).
pub const HEIGHT_DEFAULT: u16 = 8;

/// Construction-time settings for an [`LedMatrix`].
///
/// Serializable so the owning application can persist the selected topology; the matrix
/// itself never stores anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatrixConfig {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Wiring topology active after construction.
    pub topology: Topology,
    /// Supply budget used by [`LedMatrix::set_brightness`].
    pub power: PowerBudget,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            width: WIDTH_DEFAULT,
            height: HEIGHT_DEFAULT,
            topology: TOPOLOGY_DEFAULT,
            power: PowerBudget::DEFAULT,
        }
    }
}

/// Rectangular LED panel addressed in `(x, y)` coordinates.
///
/// See the [module documentation](mod@crate::matrix) for an example.
///
/// The matrix is not internally synchronized. Drive it from a single render loop, or wrap it in
/// a [`SharedMatrix`] when a topology change can race a render pass.
pub struct LedMatrix<D> {
    driver: D,
    mapper: TopologyMapper,
    power: PowerBudget,
    brightness: u8,
}

impl<D: PixelDriver> LedMatrix<D> {
    /// Create a matrix over `driver`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the width or height is zero or the driver has
    /// fewer than `width * height` LEDs.
    pub fn new(config: MatrixConfig, driver: D) -> Result<Self> {
        let MatrixConfig {
            width,
            height,
            topology,
            power,
        } = config;
        let capacity = driver.len();
        let pixel_count = usize::from(width).checked_mul(usize::from(height));
        if width == 0 || height == 0 || pixel_count.is_none_or(|count| count > capacity) {
            return Err(Error::InvalidDimensions {
                width,
                height,
                capacity,
            });
        }
        Ok(Self {
            driver,
            mapper: TopologyMapper::new(topology, width, height),
            power,
            brightness: u8::MAX,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.mapper.width()
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.mapper.height()
    }

    /// Strip index for `(x, y)`, clamped to the panel edge. Never fails.
    #[must_use]
    pub const fn map(&self, x: i32, y: i32) -> usize {
        self.mapper.map(x, y)
    }

    /// Strip index for `(x, y)`, or `width * height` when `(x, y)` is off the panel.
    #[must_use]
    pub fn map_probe(&self, x: i32, y: i32) -> usize {
        self.mapper.map_probe(x, y)
    }

    /// Switch to another wiring topology.
    ///
    /// The replacement mapper is built before it is installed, so every call observes a complete
    /// mapper. Colors already in the driver are not re-ordered.
    pub fn set_layout(&mut self, topology: Topology) {
        self.mapper = TopologyMapper::new(topology, self.mapper.width(), self.mapper.height());
        debug!("LedMatrix::set_layout: topology {}", topology.id());
    }

    /// Switch topology by numeric id. Ids outside `0..16` are ignored and the previous topology
    /// stays active.
    pub fn set_layout_id(&mut self, id: u8) {
        match Topology::from_id(id) {
            Some(topology) => self.set_layout(topology),
            None => debug!("LedMatrix::set_layout_id: ignoring unknown topology id {}", id),
        }
    }

    /// Active wiring topology.
    #[must_use]
    pub const fn layout(&self) -> Topology {
        self.mapper.topology()
    }

    /// Set the pixel at `(x, y)`.
    ///
    /// Coordinates off the panel are a no-op; unlike [`Self::map`] they are not clamped, so a
    /// stray write never lands on an unrelated edge pixel.
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if self.mapper.contains(x, y) {
            self.driver.set_pixel_color(self.mapper.map(x, y), color);
        }
    }

    /// Dim the pixel at `(x, y)` toward black by `ratio` (0 = unchanged, 255 = black).
    ///
    /// Same bounds rule as [`Self::draw_pixel`]. Lossy, see [`dim`].
    pub fn dim_pixel(&mut self, x: i32, y: i32, ratio: u8) {
        if self.mapper.contains(x, y) {
            let index = self.mapper.map(x, y);
            let dimmed = dim(self.driver.pixel_color(index), ratio);
            self.driver.set_pixel_color(index, dimmed);
        }
    }

    /// Stored color at `(x, y)`, clamped to the panel edge like [`Self::map`].
    #[must_use]
    pub fn color(&self, x: i32, y: i32) -> Rgb {
        self.driver.pixel_color(self.mapper.map(x, y))
    }

    /// Set the logical brightness (0..=255).
    ///
    /// The value forwarded to the driver is scaled by the matrix [`PowerBudget`] so that all
    /// `width * height` LEDs at full white stay within the supply current.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
        let scaled = self.power.scale_brightness(brightness, self.mapper.len());
        trace!(
            "LedMatrix::set_brightness: logical {} -> scaled {}",
            brightness, scaled
        );
        self.driver.set_brightness(scaled);
    }

    /// Last logical brightness passed to [`Self::set_brightness`] (255 until then).
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Power budget used for brightness scaling.
    #[must_use]
    pub const fn power(&self) -> PowerBudget {
        self.power
    }

    /// Set every pixel to black.
    pub fn clear(&mut self) {
        self.driver.clear();
    }

    /// Bring up the driver and push an initial frame.
    ///
    /// # Errors
    ///
    /// Propagates the driver's [`PixelDriver::begin`] error.
    pub fn begin(&mut self) -> Result<()> {
        self.driver.begin()
    }

    /// Push the stored pixels to the LEDs.
    ///
    /// # Errors
    ///
    /// Propagates the driver's [`PixelDriver::show`] error.
    pub fn show(&mut self) -> Result<()> {
        self.driver.show()
    }

    /// Whether the driver can accept another [`Self::show`].
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.driver.is_ready()
    }

    /// The underlying pixel driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the underlying pixel driver.
    pub const fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give back the underlying pixel driver.
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }
}

impl<D: PixelDriver> OriginDimensions for LedMatrix<D> {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width()), u32::from(self.height()))
    }
}

impl<D: PixelDriver> DrawTarget for LedMatrix<D> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.draw_pixel(point.x, point.y, color.to_rgb());
        }
        Ok(())
    }
}

/// An [`LedMatrix`] behind a critical-section mutex.
///
/// Use this when the render loop and whatever changes the topology (a settings handler, an
/// interrupt) can run concurrently. Every access, including a topology swap, runs inside one
/// critical section.
pub struct SharedMatrix<D> {
    matrix: Mutex<CriticalSectionRawMutex, RefCell<LedMatrix<D>>>,
}

impl<D: PixelDriver> SharedMatrix<D> {
    /// Wrap `matrix`.
    #[must_use]
    pub const fn new(matrix: LedMatrix<D>) -> Self {
        Self {
            matrix: Mutex::new(RefCell::new(matrix)),
        }
    }

    /// Run `operation` with exclusive access to the matrix.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from inside `operation`.
    pub fn lock<R>(&self, operation: impl FnOnce(&mut LedMatrix<D>) -> R) -> R {
        self.matrix
            .lock(|matrix_cell| operation(&mut matrix_cell.borrow_mut()))
    }

    /// Switch topology inside the critical section.
    pub fn set_layout(&self, topology: Topology) {
        self.lock(|matrix| matrix.set_layout(topology));
    }

    /// Active topology.
    #[must_use]
    pub fn layout(&self) -> Topology {
        self.lock(|matrix| matrix.layout())
    }

    /// Give back the wrapped matrix.
    #[must_use]
    pub fn into_inner(self) -> LedMatrix<D> {
        self.matrix.into_inner().into_inner()
    }
}
