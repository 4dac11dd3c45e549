mod coin;
mod shared;
mod store;

pub use coin::{format_history, Coin, CoinId, User, HISTORY_SEPARATOR};
pub use shared::{CoinHistory, SharedLedger};
pub use store::{EmissionReceipt, Ledger, UserBalance};

use billing_allocation::AllocationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid emission amount: {0}")]
    InvalidAmount(AllocationError),

    #[error("Emission rejected: planned {planned} coins, requested {requested}")]
    EmissionRejected { requested: u64, planned: u128 },

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Insufficient balance: {user} has {available}, needs {requested}")]
    InsufficientBalance {
        user: String,
        available: u64,
        requested: u64,
    },

    #[error("No coins have been minted")]
    NoCoins,

    #[error("Ledger is already seeded")]
    AlreadySeeded,

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Internal error: lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// Short reason reported to callers alongside a failed status.
    pub fn reason(&self) -> String {
        match self {
            Self::InvalidAmount(e) => e.to_string(),
            Self::EmissionRejected { .. } => "Not enough coins!".to_string(),
            Self::UserNotFound(_) => "User not found!".to_string(),
            Self::InsufficientBalance { .. } => "User doesn't have enough coins!".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AllocationError> for LedgerError {
    fn from(e: AllocationError) -> Self {
        match e {
            AllocationError::Rejected { requested, planned } => {
                Self::EmissionRejected { requested, planned }
            }
            other => Self::InvalidAmount(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_maps_to_emission_rejected() {
        let err: LedgerError = AllocationError::Rejected {
            requested: 2,
            planned: 3,
        }
        .into();
        assert_eq!(
            err,
            LedgerError::EmissionRejected {
                requested: 2,
                planned: 3
            }
        );
        assert_eq!(err.reason(), "Not enough coins!");
    }

    #[test]
    fn test_other_allocation_errors_are_invalid_amount() {
        let err: LedgerError = AllocationError::InvalidAmount.into();
        assert_eq!(err, LedgerError::InvalidAmount(AllocationError::InvalidAmount));
        assert_eq!(err.reason(), "Emission amount must be positive");
    }

    #[test]
    fn test_transfer_reasons() {
        assert_eq!(
            LedgerError::UserNotFound("ivan".to_string()).reason(),
            "User not found!"
        );
        let err = LedgerError::InsufficientBalance {
            user: "maria".to_string(),
            available: 1,
            requested: 2,
        };
        assert_eq!(err.reason(), "User doesn't have enough coins!");
        assert_eq!(err.to_string(), "Insufficient balance: maria has 1, needs 2");
    }
}
