//! Wiring topologies that map `(x, y)` panel coordinates to LED strip indices.
//!
//! A NeoPixel-style (WS2812) panel is a single strip folded into a rectangle. How it is folded
//! decides which strip index lights up for a given `(x, y)`. [`Topology`] names the sixteen
//! common foldings and [`TopologyMapper`] binds one of them to a panel size.
//!
//! Coordinates use a screen-style convention: `(0, 0)` is the top-left corner,
//! `x` increases to the right, and `y` increases downward.
//!
//! ```text
//! 3×2 panel, RowMajor:        3×2 panel, RowMajorAlternating:
//!   LED0  LED1  LED2            LED0  LED1  LED2
//!   LED3  LED4  LED5            LED5  LED4  LED3
//!
//! 3×2 panel, ColumnMajor:     3×2 panel, ColumnMajorAlternating:
//!   LED0  LED2  LED4            LED0  LED3  LED4
//!   LED1  LED3  LED5            LED1  LED2  LED5
//! ```

use serde::{Deserialize, Serialize};

/// Physical wiring of the LED strip inside the panel.
///
/// Each variant is a pure function from `(width, height, x, y)` to a strip index; see
/// [`Topology::index`]. For every in-range coordinate the mapping is a bijection onto
/// `0..width * height`.
///
/// The numeric ids (see [`Topology::id`]) are stable: row-major family first, then
/// column-major, each as plain, 90°, 180°, 270°, alternating, alternating 90°, 180°, 270°.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Topology {
    /// Rows left to right, top row first.
    RowMajor = 0,
    /// [`Self::RowMajor`] turned 90°.
    RowMajor90,
    /// [`Self::RowMajor`] turned 180°.
    RowMajor180,
    /// [`Self::RowMajor`] turned 270°.
    RowMajor270,
    /// Rows snake: even rows left to right, odd rows right to left.
    RowMajorAlternating,
    /// [`Self::RowMajorAlternating`] turned 90°.
    RowMajorAlternating90,
    /// [`Self::RowMajorAlternating`] turned 180°.
    RowMajorAlternating180,
    /// [`Self::RowMajorAlternating`] turned 270°.
    RowMajorAlternating270,
    /// Columns top to bottom, left column first.
    ColumnMajor,
    /// [`Self::ColumnMajor`] turned 90°.
    ColumnMajor90,
    /// [`Self::ColumnMajor`] turned 180°.
    ColumnMajor180,
    /// [`Self::ColumnMajor`] turned 270°.
    ColumnMajor270,
    /// Columns snake: even columns top to bottom, odd columns bottom to top.
    #[default]
    ColumnMajorAlternating,
    /// [`Self::ColumnMajorAlternating`] turned 90°.
    ColumnMajorAlternating90,
    /// [`Self::ColumnMajorAlternating`] turned 180°.
    ColumnMajorAlternating180,
    /// [`Self::ColumnMajorAlternating`] turned 270°.
    ColumnMajorAlternating270,
}

/// Default topology for new matrices (`Topology::ColumnMajorAlternating`).
pub const TOPOLOGY_DEFAULT: Topology = Topology::ColumnMajorAlternating;

impl Topology {
    /// Number of topologies.
    pub const COUNT: usize = 16;

    /// Every topology, in id order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::RowMajor,
        Self::RowMajor90,
        Self::RowMajor180,
        Self::RowMajor270,
        Self::RowMajorAlternating,
        Self::RowMajorAlternating90,
        Self::RowMajorAlternating180,
        Self::RowMajorAlternating270,
        Self::ColumnMajor,
        Self::ColumnMajor90,
        Self::ColumnMajor180,
        Self::ColumnMajor270,
        Self::ColumnMajorAlternating,
        Self::ColumnMajorAlternating90,
        Self::ColumnMajorAlternating180,
        Self::ColumnMajorAlternating270,
    ];

    /// Numeric id of this topology (`0..16`).
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Topology for a numeric id, or `None` when the id is out of range.
    ///
    /// ```rust
    /// use display_envoy::layout::Topology;
    ///
    /// assert_eq!(Topology::from_id(0), Some(Topology::RowMajor));
    /// assert_eq!(Topology::from_id(12), Some(Topology::ColumnMajorAlternating));
    /// assert_eq!(Topology::from_id(16), None);
    /// ```
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::RowMajor),
            1 => Some(Self::RowMajor90),
            2 => Some(Self::RowMajor180),
            3 => Some(Self::RowMajor270),
            4 => Some(Self::RowMajorAlternating),
            5 => Some(Self::RowMajorAlternating90),
            6 => Some(Self::RowMajorAlternating180),
            7 => Some(Self::RowMajorAlternating270),
            8 => Some(Self::ColumnMajor),
            9 => Some(Self::ColumnMajor90),
            10 => Some(Self::ColumnMajor180),
            11 => Some(Self::ColumnMajor270),
            12 => Some(Self::ColumnMajorAlternating),
            13 => Some(Self::ColumnMajorAlternating90),
            14 => Some(Self::ColumnMajorAlternating180),
            15 => Some(Self::ColumnMajorAlternating270),
            _ => None,
        }
    }

    /// Strip index of the in-range coordinate `(x, y)` on a `width`×`height` panel.
    ///
    /// Callers guarantee `x < width` and `y < height`; [`TopologyMapper`] does the bounds work.
    #[must_use]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "x < width and y < height, so every product stays below width * height"
    )]
    pub const fn index(self, width: u16, height: u16, x: u16, y: u16) -> usize {
        let (width, height, x, y) = (width as usize, height as usize, x as usize, y as usize);
        // Reversed coordinates.
        let rx = width - 1 - x;
        let ry = height - 1 - y;
        match self {
            Self::RowMajor => y * width + x,
            Self::RowMajor90 => rx * height + y,
            Self::RowMajor180 => ry * width + rx,
            Self::RowMajor270 => x * height + ry,
            Self::RowMajorAlternating => y * width + if is_odd(y) { rx } else { x },
            Self::RowMajorAlternating90 => rx * height + if is_odd(rx) { ry } else { y },
            Self::RowMajorAlternating180 => ry * width + if is_odd(ry) { x } else { rx },
            Self::RowMajorAlternating270 => x * height + if is_odd(x) { y } else { ry },
            Self::ColumnMajor => x * height + y,
            Self::ColumnMajor90 => y * width + rx,
            Self::ColumnMajor180 => rx * height + ry,
            Self::ColumnMajor270 => ry * width + x,
            Self::ColumnMajorAlternating => x * height + if is_odd(x) { ry } else { y },
            Self::ColumnMajorAlternating90 => y * width + if is_odd(y) { x } else { rx },
            Self::ColumnMajorAlternating180 => rx * height + if is_odd(rx) { y } else { ry },
            Self::ColumnMajorAlternating270 => ry * width + if is_odd(ry) { rx } else { x },
        }
    }
}

const fn is_odd(value: usize) -> bool {
    value & 1 == 1
}

impl From<Topology> for u8 {
    fn from(topology: Topology) -> Self {
        topology.id()
    }
}

impl TryFrom<u8> for Topology {
    /// The rejected id.
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(id)
    }
}

/// A [`Topology`] bound to a panel size: the coordinate mapper the matrix owns.
///
/// `TopologyMapper` is a plain value. Swapping topologies builds a new mapper and assigns it,
/// so no caller ever observes a matrix without one.
///
/// ```rust
/// use display_envoy::layout::{Topology, TopologyMapper};
///
/// let mapper = TopologyMapper::new(Topology::RowMajorAlternating, 3, 2);
///
/// assert_eq!(mapper.map(0, 1), 5);
/// // `map` clamps to the nearest edge...
/// assert_eq!(mapper.map(-4, 9), mapper.map(0, 1));
/// // ...while `map_probe` reports "outside" with the sentinel `width * height`.
/// assert_eq!(mapper.map_probe(-4, 9), 6);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TopologyMapper {
    topology: Topology,
    width: u16,
    height: u16,
}

impl TopologyMapper {
    /// Bind `topology` to a `width`×`height` panel.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub const fn new(topology: Topology, width: u16, height: u16) -> Self {
        assert!(width > 0 && height > 0, "width and height must be positive");
        Self {
            topology,
            width,
            height,
        }
    }

    /// Active topology.
    #[must_use]
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Panel width in pixels.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Panel height in pixels.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of pixels (`width * height`), which is also the out-of-range sentinel.
    #[must_use]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "u16 * u16 fits in usize on every supported target"
    )]
    pub const fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `(x, y)` lies on the panel.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..i32::from(self.width)).contains(&x) && (0..i32::from(self.height)).contains(&y)
    }

    /// Strip index for `(x, y)`, clamping each axis to the nearest edge first.
    ///
    /// Never fails: any coordinate maps to some valid index.
    #[must_use]
    pub const fn map(&self, x: i32, y: i32) -> usize {
        self.topology.index(
            self.width,
            self.height,
            saturate(x, self.width),
            saturate(y, self.height),
        )
    }

    /// Strip index for `(x, y)` without clamping.
    ///
    /// Returns [`Self::len`] (one past the last valid index) when `(x, y)` is off the panel.
    #[must_use]
    pub fn map_probe(&self, x: i32, y: i32) -> usize {
        match (u16::try_from(x), u16::try_from(y)) {
            (Ok(x), Ok(y)) if x < self.width && y < self.height => {
                self.topology.index(self.width, self.height, x, y)
            }
            _ => self.len(),
        }
    }
}

/// Clamp `value` into `0..len`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::arithmetic_side_effects,
    reason = "len > 0 and the clamped value lies in 0..len, which fits in u16"
)]
const fn saturate(value: i32, len: u16) -> u16 {
    let max = len as i32 - 1;
    if value < 0 {
        0
    } else if value > max {
        max as u16
    } else {
        value as u16
    }
}
