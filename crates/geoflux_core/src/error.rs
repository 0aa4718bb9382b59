//! Configuration error types

use thiserror::Error;

/// Errors raised while configuring an animation, a layer, or a light.
///
/// All of these surface synchronously from the configuring call; nothing in
/// the per-frame path returns an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Duration was zero, negative or not finite
    #[error("duration must be positive, got {0} ms")]
    InvalidDuration(f32),

    /// Track path has fewer than two points
    #[error("track path needs at least two points, got {0}")]
    PathTooShort(usize),

    /// Track path has no length to travel
    #[error("track path has zero total length")]
    DegeneratePath,

    /// Timing curve without any control point
    #[error("timing curve needs at least one control point")]
    EmptyCurve,

    /// Timing curve control data is out of range or has the wrong shape
    #[error("malformed timing curve: {0}")]
    MalformedCurve(String),

    /// Layer animation with an empty value sample list
    #[error("animation value samples must not be empty")]
    EmptySamples,

    /// startAt outside [0, 1)
    #[error("startAt must be in [0, 1), got {0}")]
    InvalidStartAt(f32),

    /// Time range with negative bounds or end before start
    #[error("invalid time range {start}..{end}")]
    InvalidRange { start: f32, end: f32 },

    /// Track rotation speed must be positive
    #[error("rotation speed must be positive, got {0} deg/s")]
    InvalidRotationSpeed(f32),

    /// Easing name not in the known set
    #[error("unknown easing: {0}")]
    UnknownEasing(String),

    /// Style key name not in the known set
    #[error("unknown style key: {0}")]
    UnknownStyleKey(String),

    /// Color string could not be parsed
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Layer id does not belong to this container
    #[error("layer is not part of this container")]
    UnknownLayer,
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
