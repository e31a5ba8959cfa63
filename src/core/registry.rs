use serde::Deserialize;
use tracing::debug;

use super::error::RegistryError;
use super::types::{Debt, DebtId};

const NEW_DEBT_NAME: &str = "New Debt";
const NEW_DEBT_BALANCE: f64 = 1_000.0;
const NEW_DEBT_RATE: f64 = 15.0;
const NEW_DEBT_MIN_PAYMENT: f64 = 25.0;

/// A single-field edit. Values are stored as given; range checks happen when
/// a plan is simulated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum DebtUpdate {
    Name(String),
    Balance(f64),
    InterestRate(f64),
    MinPayment(f64),
}

/// The editable list of debts. Never empty.
#[derive(Debug, Clone)]
pub struct DebtRegistry {
    debts: Vec<Debt>,
    next_id: u32,
}

impl Default for DebtRegistry {
    fn default() -> Self {
        Self::with_debts([
            ("Credit Card", 5_000.0, 18.99, 150.0),
            ("Personal Loan", 3_000.0, 15.49, 90.0),
        ])
    }
}

impl DebtRegistry {
    /// Builds a registry from `(name, balance, rate, min_payment)` rows. An
    /// empty input falls back to a single placeholder debt.
    pub fn with_debts<'a>(rows: impl IntoIterator<Item = (&'a str, f64, f64, f64)>) -> Self {
        let mut registry = Self {
            debts: Vec::new(),
            next_id: 1,
        };
        for (name, balance, rate, min_payment) in rows {
            let id = registry.allocate_id();
            registry
                .debts
                .push(Debt::new(id, name, balance, rate, min_payment));
        }
        if registry.debts.is_empty() {
            registry.add_debt();
        }
        registry
    }

    pub fn debts(&self) -> &[Debt] {
        &self.debts
    }

    pub fn len(&self) -> usize {
        self.debts.len()
    }

    /// Always false: `remove_debt` refuses to drop the last row.
    pub fn is_empty(&self) -> bool {
        self.debts.is_empty()
    }

    pub fn get(&self, id: DebtId) -> Option<&Debt> {
        self.debts.iter().find(|d| d.id == id)
    }

    /// Independent copy of the current rows for a simulation run.
    pub fn snapshot(&self) -> Vec<Debt> {
        self.debts.clone()
    }

    pub fn add_debt(&mut self) -> DebtId {
        let id = self.allocate_id();
        self.debts.push(Debt::new(
            id,
            NEW_DEBT_NAME,
            NEW_DEBT_BALANCE,
            NEW_DEBT_RATE,
            NEW_DEBT_MIN_PAYMENT,
        ));
        debug!(%id, count = self.debts.len(), "debt added");
        id
    }

    pub fn remove_debt(&mut self, id: DebtId) -> Result<Debt, RegistryError> {
        let idx = self
            .debts
            .iter()
            .position(|d| d.id == id)
            .ok_or(RegistryError::UnknownDebt(id))?;
        if self.debts.len() == 1 {
            return Err(RegistryError::LastDebt);
        }
        let removed = self.debts.remove(idx);
        debug!(%id, count = self.debts.len(), "debt removed");
        Ok(removed)
    }

    pub fn update_debt(&mut self, id: DebtId, update: DebtUpdate) -> Result<&Debt, RegistryError> {
        let debt = self
            .debts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(RegistryError::UnknownDebt(id))?;
        match update {
            DebtUpdate::Name(name) => debt.name = name,
            DebtUpdate::Balance(v) => debt.balance = v,
            DebtUpdate::InterestRate(v) => debt.interest_rate = v,
            DebtUpdate::MinPayment(v) => debt.min_payment = v,
        }
        debug!(%id, "debt updated");
        Ok(&*debt)
    }

    pub fn total_balance(&self) -> f64 {
        self.debts.iter().map(|d| d.balance).sum()
    }

    pub fn total_min_payment(&self) -> f64 {
        self.debts.iter().map(|d| d.min_payment).sum()
    }

    /// Balance-weighted APR in percent; 0 when nothing is owed.
    pub fn weighted_average_rate(&self) -> f64 {
        let total = self.total_balance();
        if total <= 0.0 {
            return 0.0;
        }
        self.debts
            .iter()
            .map(|d| d.balance * d.interest_rate)
            .sum::<f64>()
            / total
    }

    fn allocate_id(&mut self) -> DebtId {
        let id = DebtId(self.next_id);
        self.next_id += 1;
        id
    }
}
