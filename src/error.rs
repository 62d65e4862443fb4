//! Domain error taxonomy.
//!
//! Every manager operation returns `Result<_, PosError>`; the menu
//! controller pattern-matches the error and renders a notice. Nothing in
//! the interactive loop panics or propagates past the dispatch boundary.

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum PosError {
    /// The identifier is already taken in the target mapping.
    DuplicateId(String),
    /// No record under this identifier.
    NotFound(String),
    /// Price input was not a finite non-negative number.
    InvalidPrice,
    /// Quantity input was not a strictly positive integer.
    InvalidQuantity,
    /// Persistence failed; the in-memory mutation stands.
    Store(StoreError),
}

impl std::fmt::Display for PosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PosError::DuplicateId(id) => write!(f, "identifier '{id}' already exists"),
            PosError::NotFound(id) => write!(f, "no record for identifier '{id}'"),
            PosError::InvalidPrice => write!(f, "price must be a non-negative number"),
            PosError::InvalidQuantity => write!(f, "quantity must be a positive integer"),
            PosError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PosError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PosError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for PosError {
    fn from(e: StoreError) -> Self {
        PosError::Store(e)
    }
}
