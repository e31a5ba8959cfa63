use thiserror::Error;

use super::types::DebtId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtField {
    Balance,
    InterestRate,
    MinPayment,
}

impl DebtField {
    pub fn as_str(self) -> &'static str {
        match self {
            DebtField::Balance => "balance",
            DebtField::InterestRate => "interestRate",
            DebtField::MinPayment => "minPayment",
        }
    }
}

impl std::fmt::Display for DebtField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a plan is rejected before any month is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("at least one debt is required")]
    EmptyPlan,

    #[error("debt #{index} ({name}): {field} {reason}")]
    InvalidDebt {
        index: usize,
        name: String,
        field: DebtField,
        reason: &'static str,
    },

    #[error("extra payment must be a finite amount >= 0, got {0}")]
    InvalidExtraPayment(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("the last remaining debt cannot be removed")]
    LastDebt,

    #[error("no debt with id {0}")]
    UnknownDebt(DebtId),
}
