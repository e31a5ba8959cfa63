use std::cmp::Ordering;

use tracing::{debug, warn};

use super::error::{DebtField, PlanError};
use super::types::{
    Debt, DebtId, DebtPayment, MAX_MONTHS, MonthRecord, PayoffResult, Strategy,
};

/// Post-payment balances below this are floating-point residue of
/// `(balance + interest) - interest` and count as paid off.
const PAID_OFF_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
struct WorkingDebt {
    order: usize,
    id: DebtId,
    name: String,
    balance: f64,
    interest_rate: f64,
    monthly_rate: f64,
    min_payment: f64,
}

impl WorkingDebt {
    fn from_debt(order: usize, debt: &Debt) -> Self {
        Self {
            order,
            id: debt.id,
            name: debt.name.clone(),
            balance: debt.balance,
            interest_rate: debt.interest_rate,
            monthly_rate: debt.monthly_rate(),
            min_payment: debt.min_payment,
        }
    }
}

#[derive(Debug, Default)]
struct Totals {
    paid: f64,
    interest: f64,
}

pub fn validate_plan(debts: &[Debt], extra_payment: f64) -> Result<(), PlanError> {
    if debts.is_empty() {
        return Err(PlanError::EmptyPlan);
    }

    for (index, debt) in debts.iter().enumerate() {
        let invalid = |field, reason| PlanError::InvalidDebt {
            index,
            name: debt.name.clone(),
            field,
            reason,
        };

        if !debt.balance.is_finite() || debt.balance <= 0.0 {
            return Err(invalid(DebtField::Balance, "must be a finite amount > 0"));
        }
        if !debt.interest_rate.is_finite() || debt.interest_rate < 0.0 {
            return Err(invalid(DebtField::InterestRate, "must be a finite rate >= 0"));
        }
        if !debt.min_payment.is_finite() || debt.min_payment <= 0.0 {
            return Err(invalid(DebtField::MinPayment, "must be a finite amount > 0"));
        }
    }

    if !extra_payment.is_finite() || extra_payment < 0.0 {
        return Err(PlanError::InvalidExtraPayment(extra_payment));
    }

    Ok(())
}

/// Simulates month-by-month paydown of `debts` under `strategy`, putting
/// `extra_payment` on the strategy's top-priority open debt each month.
///
/// The input slice is only read; balances evolve on a private copy. Runs
/// until every balance is zero or [`MAX_MONTHS`] have elapsed, in which case
/// the result comes back with `converged == false`.
pub fn simulate(
    debts: &[Debt],
    extra_payment: f64,
    strategy: Strategy,
) -> Result<PayoffResult, PlanError> {
    validate_plan(debts, extra_payment)?;

    let mut working = debts
        .iter()
        .enumerate()
        .map(|(order, debt)| WorkingDebt::from_debt(order, debt))
        .collect::<Vec<_>>();
    let mut totals = Totals::default();
    let mut schedule = Vec::new();

    for month in 1..=MAX_MONTHS {
        let record = simulate_month(&mut working, extra_payment, strategy, month, &mut totals);
        let done = record.total_remaining <= 0.0;
        schedule.push(record);
        if done {
            break;
        }
    }

    let converged = schedule
        .last()
        .is_some_and(|record| record.total_remaining <= 0.0);
    let result = PayoffResult {
        strategy,
        total_months: schedule.len() as u32,
        total_paid: totals.paid,
        total_interest: totals.interest,
        converged,
        payoff_schedule: schedule,
    };

    debug!(
        %strategy,
        months = result.total_months,
        total_paid = result.total_paid,
        total_interest = result.total_interest,
        converged,
        "payoff simulated"
    );
    if !converged {
        warn!(
            %strategy,
            remaining = result.final_remaining(),
            "payment plan does not pay off within {MAX_MONTHS} months"
        );
    }

    Ok(result)
}

fn simulate_month(
    working: &mut [WorkingDebt],
    extra_payment: f64,
    strategy: Strategy,
    month: u32,
    totals: &mut Totals,
) -> MonthRecord {
    working.sort_by(|a, b| priority(strategy, a, b));

    let target = working.iter().position(|d| d.balance > 0.0);
    let mut extra_left = extra_payment;
    let mut entries = Vec::with_capacity(working.len());

    for (idx, debt) in working.iter_mut().enumerate() {
        if debt.balance <= 0.0 {
            continue;
        }

        let interest = debt.balance * debt.monthly_rate;
        let payoff_amount = debt.balance + interest;
        let mut payment = debt.min_payment.min(payoff_amount);

        if Some(idx) == target && extra_left > 0.0 {
            let applied = extra_left.min(payoff_amount - payment);
            payment += applied;
            extra_left -= applied;
        }

        let principal = payment - interest;
        let mut balance = (debt.balance - principal).max(0.0);
        if balance < PAID_OFF_EPSILON {
            balance = 0.0;
        }
        debt.balance = balance;

        totals.paid += payment;
        totals.interest += interest;
        entries.push(DebtPayment {
            id: debt.id,
            name: debt.name.clone(),
            payment,
            balance,
            interest_paid: interest,
        });
    }

    MonthRecord {
        month,
        debts: entries,
        total_remaining: working.iter().map(|d| d.balance).sum(),
    }
}

/// Ordering of open debts for a month. Ties fall back to the order the
/// debts were supplied in, so results never depend on sort internals.
fn priority(strategy: Strategy, a: &WorkingDebt, b: &WorkingDebt) -> Ordering {
    let primary = match strategy {
        Strategy::Avalanche => b.interest_rate.total_cmp(&a.interest_rate),
        Strategy::Snowball => a.balance.total_cmp(&b.balance),
    };
    primary.then(a.order.cmp(&b.order))
}
