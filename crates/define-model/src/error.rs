use thiserror::Error;

use crate::oid::OidKind;

/// Errors raised while building or rearranging model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A deterministic OID was requested but is already taken.
    #[error("{kind} OID '{oid}' already exists")]
    OidCollision { kind: OidKind, oid: String },

    #[error("invalid {kind} OID suffix: {suffix:?}")]
    InvalidSuffix { kind: OidKind, suffix: String },

    /// An order array replacement is not a permutation of the current one.
    #[error("new {collection} order is not a permutation of the current order")]
    NotAPermutation { collection: &'static str },

    #[error("position {position} is out of range for {collection} (length {len})")]
    InvalidPosition {
        collection: &'static str,
        position: usize,
        len: usize,
    },

    #[error("{collection} already contains '{oid}'")]
    DuplicateOid { collection: &'static str, oid: String },

    /// Key order must be a duplicate-free subset of the item ref order.
    #[error("key order is invalid: '{oid}' is not a distinct item ref of the container")]
    InvalidKeyOrder { oid: String },

    /// Two item refs of one container would point at the same item def.
    #[error("item def '{item_oid}' is already referenced by this container")]
    DuplicateItemRef { item_oid: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
