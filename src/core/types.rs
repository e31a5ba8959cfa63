use std::fmt;

use serde::Serialize;

/// Monthly simulation cap; a plan still carrying a balance after this many
/// months never pays off.
pub const MAX_MONTHS: u32 = 600;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct DebtId(pub u32);

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Highest interest rate first.
    Avalanche,
    /// Smallest balance first.
    Snowball,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Avalanche, Strategy::Snowball];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Avalanche => "avalanche",
            Strategy::Snowball => "snowball",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A debt account as the user entered it. `interest_rate` is a nominal
/// annual percentage, so `18.99` means 18.99% APR.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub balance: f64,
    pub interest_rate: f64,
    pub min_payment: f64,
}

impl Debt {
    pub fn new(
        id: DebtId,
        name: impl Into<String>,
        balance: f64,
        interest_rate: f64,
        min_payment: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
            interest_rate,
            min_payment,
        }
    }

    pub fn monthly_rate(&self) -> f64 {
        self.interest_rate / 100.0 / 12.0
    }
}

/// One debt's line in a simulated month; `balance` is the balance after
/// the payment was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayment {
    pub id: DebtId,
    pub name: String,
    pub payment: f64,
    pub balance: f64,
    pub interest_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    pub month: u32,
    pub debts: Vec<DebtPayment>,
    pub total_remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoff {
    pub id: DebtId,
    pub name: String,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffResult {
    pub strategy: Strategy,
    pub total_months: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub converged: bool,
    pub payoff_schedule: Vec<MonthRecord>,
}

impl PayoffResult {
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    pub fn final_remaining(&self) -> f64 {
        self.payoff_schedule
            .last()
            .map(|m| m.total_remaining)
            .unwrap_or(0.0)
    }

    /// Month in which each debt first reached a zero balance, earliest first.
    /// Debts still open at the end of the schedule come last with `None`.
    pub fn payoff_order(&self) -> Vec<DebtPayoff> {
        let mut payoffs: Vec<DebtPayoff> = Vec::new();
        for record in &self.payoff_schedule {
            for entry in &record.debts {
                let existing = payoffs.iter_mut().find(|p| p.id == entry.id);
                let paid_off_now = entry.balance <= 0.0;
                match existing {
                    Some(p) => {
                        if p.month.is_none() && paid_off_now {
                            p.month = Some(record.month);
                        }
                    }
                    None => payoffs.push(DebtPayoff {
                        id: entry.id,
                        name: entry.name.clone(),
                        month: paid_off_now.then_some(record.month),
                    }),
                }
            }
        }

        payoffs.sort_by_key(|p| p.month.unwrap_or(u32::MAX));
        payoffs
    }
}
