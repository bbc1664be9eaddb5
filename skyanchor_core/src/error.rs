// skyanchor_core/src/error.rs

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while wiring up an anchored object.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    /// A required collaborator was never supplied. Fatal at construction time.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
