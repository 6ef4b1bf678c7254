//! Error types for shoot-core operations.
//! Keep ShootFfiError minimal and stable to avoid breaking FFI clients.

// ═══════════════════════════════════════════════════════════════════════════════
// User-facing Rejections
// ═══════════════════════════════════════════════════════════════════════════════

/// An action the operator attempted that the session refused.
///
/// These are advisory: hosts surface them as a dismissible notice and the
/// session state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum ActionRejection {
    #[error("not on duty, cannot start recording")]
    NotOnDuty,

    #[error("cannot end directly while shooting")]
    CannotEndWhileShooting,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Swift/Kotlin/Python)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ShootFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for ShootFfiError {
    fn from(message: String) -> Self {
        ShootFfiError::General { message }
    }
}

impl From<&str> for ShootFfiError {
    fn from(message: &str) -> Self {
        ShootFfiError::General {
            message: message.to_string(),
        }
    }
}

impl From<ShootError> for ShootFfiError {
    fn from(err: ShootError) -> Self {
        ShootFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur in shoot-core operations.
///
/// For FFI boundaries, use `ShootFfiError` instead.
#[derive(Debug, thiserror::Error)]
pub enum ShootError {
    // ─────────────────────────────────────────────────────────────────────
    // Environment Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeNotFound,

    // ─────────────────────────────────────────────────────────────────────
    // Tag Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Tag not found: {id}")]
    TagNotFound { id: String },

    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    // ─────────────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Store error: {context}: {source}")]
    Store {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using ShootError.
pub type Result<T> = std::result::Result<T, ShootError>;

impl From<ShootError> for String {
    fn from(err: ShootError) -> String {
        err.to_string()
    }
}
