//! Transaction controller states
//!
//! ```text
//! Idle ──begin──▶ Active ──commit───▶ Committing ──▶ Idle
//!                    │
//!                    └────rollback──▶ RollingBack ─▶ Idle
//! ```
//!
//! `Committing` and `RollingBack` are only observable from inside the
//! controller (and by subscribers running during commit emission).

use folio_core::{Error, Result};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionStatus {
    /// No transaction; writes go straight to base
    #[default]
    Idle,
    /// Transaction open; writes go to the overlay
    Active,
    /// Applying the operation buffer to base
    Committing,
    /// Discarding the overlay
    RollingBack,
}

impl TransactionStatus {
    /// State name, as reported in [`Error::TransactionState`]
    pub fn name(&self) -> &'static str {
        match self {
            TransactionStatus::Idle => "Idle",
            TransactionStatus::Active => "Active",
            TransactionStatus::Committing => "Committing",
            TransactionStatus::RollingBack => "RollingBack",
        }
    }

    /// Check if a transaction is open
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionStatus::Active)
    }

    /// Fail with [`Error::TransactionState`] unless in `expected`
    pub fn expect(&self, expected: TransactionStatus) -> Result<()> {
        if *self == expected {
            Ok(())
        } else {
            Err(Error::TransactionState {
                expected: expected.name(),
                actual: self.name(),
            })
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
