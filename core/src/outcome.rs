use crate::model::piece::PieceId;

/// Why the store declined to apply an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("piece name is empty")]
    EmptyName,

    #[error("already tracking the maximum of {limit} pieces")]
    CapacityReached { limit: usize },

    #[error("'{input}' is not a positive whole number of minutes")]
    InvalidMinutes { input: String },

    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),
}

/// Result of a store operation whose preconditions were checked.
///
/// `Rejected` guarantees nothing was changed or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Applied(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }
}

impl<T> From<Rejection> for Outcome<T> {
    fn from(reason: Rejection) -> Self {
        Outcome::Rejected(reason)
    }
}
