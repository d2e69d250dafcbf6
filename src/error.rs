//! Error types shared across the crate.

/// Errors raised while building or parsing pattern descriptions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern kind is not one of the built-in tiling rules.
    #[error("invalid pattern kind: {0:?}")]
    InvalidPatternKind(String),

    /// A serialized pattern or profile could not be parsed.
    #[error("serialization error: {0}")]
    Serde(String),
}

/// Errors raised when bytes do not decode to a canvas-sized raster image.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No bytes were supplied.
    #[error("empty image data")]
    Empty,

    /// The bytes are not a readable PNG (truncated, corrupt, or another format).
    #[error("image decode failed: {0}")]
    Image(String),

    /// The image decoded but does not have the canvas dimensions.
    #[error("expected a 200x200 image, got {width}x{height}")]
    DimensionMismatch { width: u32, height: u32 },
}

/// Error raised when a raster image cannot be written as PNG.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("image encode failed: {0}")]
pub struct EncodeError(pub String);

/// Errors raised by a key/value persistence area.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The key cannot be used to address a value.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    /// Underlying filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by gallery mutations.
#[derive(thiserror::Error, Debug)]
pub enum GalleryError {
    /// `remove` was called with a position outside the collection.
    #[error("index {index} out of range for gallery of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// `remove_matching` found no entry with identical pixels.
    #[error("no gallery entry matches the given image")]
    NoMatchingEntry,

    /// An image could not be encoded for storage.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The collection could not be serialized.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The persistence area rejected the read or write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GalleryError {
    /// Build a [`GalleryError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Convenience result type for gallery operations.
pub type GalleryResult<T> = Result<T, GalleryError>;
