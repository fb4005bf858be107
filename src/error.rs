//! Crate-wide error type.

use derive_more::{Display, Error, From};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by this crate and by the collaborators plugged into it.
///
/// None of these are fatal. Each one degrades a single operation and is logged where it occurs.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Matrix width or height is zero, or `width * height` does not fit the pixel driver.
    #[display("matrix {width}x{height} does not fit a driver with {capacity} LEDs")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u16,
        /// Requested height in pixels.
        height: u16,
        /// Number of LEDs the driver can address.
        capacity: usize,
    },

    /// Inbound payload is larger than the configured decode budget.
    #[display("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
        /// Configured limit in bytes.
        max: usize,
    },

    /// Inbound payload is not a JSON object.
    #[display("invalid payload: {_0}")]
    #[from]
    InvalidPayload(#[error(not(source))] serde_json::Error),

    /// The `file` field of a file-transfer message is not valid base64.
    #[display("invalid base64 file content: {_0}")]
    #[from]
    Base64Decode(#[error(not(source))] base64::DecodeSliceError),

    /// The messaging service refused a subscription.
    #[display("subscribe failed")]
    SubscribeFailed,

    /// The messaging service failed to drop a subscription.
    #[display("unsubscribe failed")]
    UnsubscribeFailed,

    /// No plugin with this UID is known to the plugin directory.
    #[display("no plugin with uid {uid}")]
    UnknownPlugin {
        /// UID looked up.
        uid: u16,
    },

    /// A file could not be created (or truncated) for writing.
    #[display("file could not be created")]
    FileCreate,

    /// Writing file content failed after the file was opened.
    #[display("file could not be written")]
    FileWrite,

    /// The LED writer behind a pixel driver failed to push a frame.
    #[display("LED driver write failed")]
    DriverWrite,
}
