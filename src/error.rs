//! Engine error types.
//!
//! Only malformed external input ends up here. Degraded-but-valid data (no
//! trajectory yet, a trajectory that never reaches the surface, noisy
//! altitudes, out-of-range scrubs) is handled locally by the engine and is
//! never reported as an error.
//!
//! ## Usage
//!
//! ```rust
//! use impactscope::error::{ensure_finite, EngineResult};
//!
//! fn check(altitude_km: f64) -> EngineResult<()> {
//!     ensure_finite("trajectory[3]", "altitude_km", altitude_km)?;
//!     Ok(())
//! }
//! # assert!(check(12.0).is_ok());
//! # assert!(check(f64::NAN).is_err());
//! ```

use std::fmt;

/// Top-level error enum for external data handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A numeric field was NaN or infinite.
    NonFinite {
        /// Which record the field belongs to, e.g. `"trajectory[12]"`.
        context: String,
        /// Field name as it appears in the input.
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// A value is finite but physically meaningless for the engine.
    OutOfRange {
        /// Name of the field or parameter.
        name: &'static str,
        /// The value that was rejected.
        value: f64,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },

    /// Input text could not be parsed, or a required field was missing.
    Parse {
        /// Where the text came from (file path or `"<inline>"`).
        source_name: String,
        /// Parser message.
        message: String,
    },

    /// Scenario file written by a format version this build cannot read.
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Highest version this build reads.
        supported: u32,
    },

    /// Input file could not be read.
    Io {
        /// Path that was read.
        path: String,
        /// OS error text.
        message: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NonFinite {
                context,
                field,
                value,
            } => write!(f, "{context}: field '{field}' is not finite ({value})"),
            EngineError::OutOfRange {
                name,
                value,
                expected,
            } => write!(f, "'{name}' = {value} is outside expected range {expected}"),
            EngineError::Parse {
                source_name,
                message,
            } => write!(f, "failed to parse {source_name}: {message}"),
            EngineError::UnsupportedVersion { found, supported } => write!(
                f,
                "unsupported scenario version {found} (this build reads up to {supported})"
            ),
            EngineError::Io { path, message } => write!(f, "failed to read {path}: {message}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Convenience alias: a `Result` using `EngineError` as the error type.
pub type EngineResult<T> = Result<T, EngineError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `value` is NaN or infinite.
pub fn ensure_finite(context: &str, field: &'static str, value: f64) -> EngineResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::NonFinite {
            context: context.to_string(),
            field,
            value,
        })
    }
}

/// Returns an error unless `value` is finite and strictly positive.
pub fn ensure_positive(name: &'static str, value: f64) -> EngineResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::OutOfRange {
            name,
            value,
            expected: "(0.0, ∞)",
        })
    }
}
