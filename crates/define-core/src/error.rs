//! Error types for dispatching actions.

use define_model::{ModelError, OidKind};
use thiserror::Error;

/// Reasons a dispatch is rejected. A rejected dispatch leaves the state
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A rename or insert would reuse an OID already in the table.
    #[error("{kind} OID '{oid}' already exists")]
    OidCollision { kind: OidKind, oid: String },

    /// The action points at an entity that does not exist.
    #[error("{kind} '{oid}' does not exist")]
    MissingReference { kind: OidKind, oid: String },

    #[error("{collection} already contains '{oid}'")]
    DuplicateOid { collection: &'static str, oid: String },

    /// Two item refs of one container would point at the same item def.
    #[error("item def '{item_oid}' is already referenced by this container")]
    DuplicateItemRef { item_oid: String },

    #[error("new {collection} order is not a permutation of the current order")]
    NotAPermutation { collection: &'static str },

    #[error("key order is invalid: '{oid}' is not a distinct item ref of the container")]
    InvalidKeyOrder { oid: String },

    #[error("position {position} is out of range for {collection} (length {len})")]
    InvalidPosition {
        collection: &'static str,
        position: usize,
        len: usize,
    },

    /// The action is well-formed but cannot be applied to this state.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A `DEL_*` closure leaves out an entity its delete releases.
    #[error("{action} closure is incomplete: it keeps {omitted}")]
    IncompleteClosure {
        action: &'static str,
        omitted: String,
    },

    /// The candidate state failed the integrity check.
    #[error("dispatch would leave {count} integrity issue(s), first: {first}")]
    IntegrityDrift { count: usize, first: String },

    #[error(transparent)]
    Model(ModelError),
}

impl CoreError {
    pub fn missing(kind: OidKind, oid: impl ToString) -> Self {
        Self::MissingReference {
            kind,
            oid: oid.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidAction(message.into())
    }
}

impl From<ModelError> for CoreError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::OidCollision { kind, oid } => Self::OidCollision { kind, oid },
            ModelError::NotAPermutation { collection } => Self::NotAPermutation { collection },
            ModelError::InvalidPosition {
                collection,
                position,
                len,
            } => Self::InvalidPosition {
                collection,
                position,
                len,
            },
            ModelError::DuplicateOid { collection, oid } => Self::DuplicateOid { collection, oid },
            ModelError::InvalidKeyOrder { oid } => Self::InvalidKeyOrder { oid },
            ModelError::DuplicateItemRef { item_oid } => Self::DuplicateItemRef { item_oid },
            other => Self::Model(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
