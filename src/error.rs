//! Error types for frame construction, transcoding and schema loading
//!
//! | Variant | Raised by | Recovery |
//! |---------|-----------|----------|
//! | `Config` | schema loading | fatal, aborts initialization |
//! | `Build` / `UnknownField` | frame builder | fatal for the run |
//! | `Transcode` | ASCII inbound conversion, strict outbound | fatal for the call |
//! | `Simulation` | loop-back transport | fatal for the run |
//! | `Json` / `Io` | schema loading | fatal |
//!
//! Checksum mismatches are not errors: validation reports them as `false`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors raised while loading a schema or building, converting and
/// simulating frames.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Missing or invalid schema field.
    #[error("Configuration error in {entity}: {message}")]
    Config { entity: String, message: String },

    /// A segment value could not be resolved during frame assembly.
    #[error("Build error for segment '{field}': {message}")]
    Build { field: String, message: String },

    /// Message has no attribute with the requested name.
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// Malformed ASCII-mode input or a disallowed byte in strict mode.
    #[error("Transcode error at position {position} (byte 0x{byte:02X}): {message}")]
    Transcode {
        position: usize,
        byte: u8,
        message: String,
    },

    /// Transmit or receive buffer missing at simulation time.
    #[error("Simulation error: {message}")]
    Simulation { message: String },

    /// Schema document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Create a configuration error for the named schema entity
    pub fn config<E: Into<String>, M: Into<String>>(entity: E, message: M) -> Self {
        FrameError::Config {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a build error for the named segment
    pub fn build<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        FrameError::Build {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unknown-field error
    pub fn unknown_field<F: Into<String>>(field: F) -> Self {
        FrameError::UnknownField {
            field: field.into(),
        }
    }

    /// Create a transcode error at the given position
    pub fn transcode<M: Into<String>>(position: usize, byte: u8, message: M) -> Self {
        FrameError::Transcode {
            position,
            byte,
            message: message.into(),
        }
    }

    /// Create a simulation precondition error
    pub fn simulation<M: Into<String>>(message: M) -> Self {
        FrameError::Simulation {
            message: message.into(),
        }
    }

    /// Short category name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::Config { .. } => "config",
            FrameError::Build { .. } | FrameError::UnknownField { .. } => "build",
            FrameError::Transcode { .. } => "transcode",
            FrameError::Simulation { .. } => "simulation",
            FrameError::Json(_) => "json",
            FrameError::Io(_) => "io",
        }
    }
}
