//! Startup result types.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How readiness (or safe mode) was reached. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootMode {
    Primary,
    Fallback,
    SafeMode,
    SafeModeTimeout,
}

impl BootMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BootMode::Primary => "primary",
            BootMode::Fallback => "fallback",
            BootMode::SafeMode => "safe-mode",
            BootMode::SafeModeTimeout => "safe-mode-timeout",
        }
    }
}

impl std::fmt::Display for BootMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a durable-store bootstrap hands back.
pub enum BootstrapResult<S> {
    Ready {
        store: S,
        mode: BootMode,
        warning: Option<String>,
    },
    Failed(String),
}

/// The durable-store collaborator: one async "bootstrap with fallback".
#[async_trait]
pub trait Bootstrapper: Send + Sync + 'static {
    type Store: Send + Sync + 'static;

    async fn bootstrap(&self) -> BootstrapResult<Self::Store>;
}

pub enum BootOutcome<S> {
    Loading,
    Ready {
        store: Arc<S>,
        mode: BootMode,
        warning: Option<String>,
    },
    SafeMode {
        message: String,
        mode: BootMode,
    },
}

impl<S> BootOutcome<S> {
    pub fn is_loading(&self) -> bool {
        matches!(self, BootOutcome::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BootOutcome::Ready { .. })
    }

    pub fn is_safe_mode(&self) -> bool {
        matches!(self, BootOutcome::SafeMode { .. })
    }

    pub fn store(&self) -> Option<Arc<S>> {
        match self {
            BootOutcome::Ready { store, .. } => Some(Arc::clone(store)),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<BootMode> {
        match self {
            BootOutcome::Loading => None,
            BootOutcome::Ready { mode, .. } | BootOutcome::SafeMode { mode, .. } => Some(*mode),
        }
    }

    pub fn summary(&self) -> BootSummary {
        match self {
            BootOutcome::Loading => BootSummary {
                state: "loading",
                mode: None,
                warning: None,
                message: None,
            },
            BootOutcome::Ready { mode, warning, .. } => BootSummary {
                state: "ready",
                mode: Some(*mode),
                warning: warning.clone(),
                message: None,
            },
            BootOutcome::SafeMode { message, mode } => BootSummary {
                state: "safe_mode",
                mode: Some(*mode),
                warning: None,
                message: Some(message.clone()),
            },
        }
    }
}

// Manual impls: the store is shared, so cloning never requires `S: Clone`.
impl<S> Clone for BootOutcome<S> {
    fn clone(&self) -> Self {
        match self {
            BootOutcome::Loading => BootOutcome::Loading,
            BootOutcome::Ready {
                store,
                mode,
                warning,
            } => BootOutcome::Ready {
                store: Arc::clone(store),
                mode: *mode,
                warning: warning.clone(),
            },
            BootOutcome::SafeMode { message, mode } => BootOutcome::SafeMode {
                message: message.clone(),
                mode: *mode,
            },
        }
    }
}

impl<S> std::fmt::Debug for BootOutcome<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootOutcome::Loading => f.write_str("Loading"),
            BootOutcome::Ready { mode, warning, .. } => f
                .debug_struct("Ready")
                .field("mode", mode)
                .field("warning", warning)
                .finish_non_exhaustive(),
            BootOutcome::SafeMode { message, mode } => f
                .debug_struct("SafeMode")
                .field("message", message)
                .field("mode", mode)
                .finish(),
        }
    }
}

/// Serializable view of an outcome for logs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootSummary {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<BootMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
