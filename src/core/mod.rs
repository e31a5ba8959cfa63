mod comparator;
mod engine;
mod error;
mod registry;
mod types;

pub use comparator::{StrategyComparison, compare};
pub use engine::{simulate, validate_plan};
pub use error::{DebtField, PlanError, RegistryError};
pub use registry::{DebtRegistry, DebtUpdate};
pub use types::{
    Debt, DebtId, DebtPayment, DebtPayoff, MAX_MONTHS, MonthRecord, PayoffResult, Strategy,
};
