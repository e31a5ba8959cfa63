use serde::Serialize;

use super::engine::simulate;
use super::error::PlanError;
use super::types::{Debt, PayoffResult, Strategy};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub avalanche: PayoffResult,
    pub snowball: PayoffResult,
}

impl StrategyComparison {
    /// Interest avoided by choosing avalanche over snowball. Negative when
    /// snowball happens to be cheaper for this plan.
    pub fn interest_saved(&self) -> f64 {
        self.snowball.total_interest - self.avalanche.total_interest
    }

    pub fn months_saved(&self) -> i64 {
        i64::from(self.snowball.total_months) - i64::from(self.avalanche.total_months)
    }

    /// The cheaper strategy by total interest; avalanche wins ties.
    pub fn recommended(&self) -> Strategy {
        if self.snowball.total_interest < self.avalanche.total_interest {
            Strategy::Snowball
        } else {
            Strategy::Avalanche
        }
    }

    pub fn result(&self, strategy: Strategy) -> &PayoffResult {
        match strategy {
            Strategy::Avalanche => &self.avalanche,
            Strategy::Snowball => &self.snowball,
        }
    }

    pub fn all_converged(&self) -> bool {
        self.avalanche.is_converged() && self.snowball.is_converged()
    }
}

/// Runs both strategies over the same starting debts. Each run works on its
/// own copy, so neither can observe the other.
pub fn compare(debts: &[Debt], extra_payment: f64) -> Result<StrategyComparison, PlanError> {
    let avalanche = simulate(debts, extra_payment, Strategy::Avalanche)?;
    let snowball = simulate(debts, extra_payment, Strategy::Snowball)?;
    Ok(StrategyComparison {
        avalanche,
        snowball,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DebtId;
    use proptest::collection::vec;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn debt(id: u32, name: &str, balance: f64, rate: f64, min_payment: f64) -> Debt {
        Debt::new(DebtId(id), name, balance, rate, min_payment)
    }

    fn two_debts() -> Vec<Debt> {
        vec![
            debt(1, "Credit Card", 5_000.0, 18.99, 150.0),
            debt(2, "Personal Loan", 3_000.0, 15.49, 90.0),
        ]
    }

    #[test]
    fn compare_reports_interest_saved_for_two_debts() {
        let comparison = compare(&two_debts(), 200.0).expect("valid plan");
        assert_eq!(comparison.avalanche.strategy, Strategy::Avalanche);
        assert_eq!(comparison.snowball.strategy, Strategy::Snowball);
        assert!(comparison.interest_saved() > 0.0);
        assert!((comparison.interest_saved() - 188.77).abs() < 0.01);
        assert_eq!(comparison.months_saved(), 0);
        assert_eq!(comparison.recommended(), Strategy::Avalanche);
        assert!(comparison.all_converged());
        assert_ne!(
            comparison.avalanche.payoff_schedule[0].debts[0].id,
            comparison.snowball.payoff_schedule[0].debts[0].id
        );
    }

    #[test]
    fn compare_matches_independent_runs_in_either_order() {
        let debts = two_debts();
        let comparison = compare(&debts, 200.0).expect("valid plan");

        let snowball_first = simulate(&debts, 200.0, Strategy::Snowball).expect("valid plan");
        let avalanche_second = simulate(&debts, 200.0, Strategy::Avalanche).expect("valid plan");
        assert_eq!(comparison.snowball, snowball_first);
        assert_eq!(comparison.avalanche, avalanche_second);
        assert_eq!(comparison.result(Strategy::Snowball), &snowball_first);
    }

    #[test]
    fn compare_rejects_invalid_plan() {
        assert_eq!(compare(&[], 0.0), Err(PlanError::EmptyPlan));
        let mut debts = two_debts();
        debts[0].interest_rate = -3.0;
        assert!(matches!(
            compare(&debts, 0.0),
            Err(PlanError::InvalidDebt { index: 0, .. })
        ));
    }

    #[test]
    fn avalanche_is_cheaper_for_high_rate_large_balance() {
        let debts = vec![
            debt(1, "Store Card", 800.0, 9.9, 40.0),
            debt(2, "Credit Card", 6_500.0, 27.5, 180.0),
            debt(3, "Car Loan", 11_000.0, 6.4, 260.0),
        ];
        let comparison = compare(&debts, 300.0).expect("valid plan");
        assert!(comparison.avalanche.total_interest <= comparison.snowball.total_interest);
        assert_eq!(comparison.recommended(), Strategy::Avalanche);
    }

    #[test]
    fn non_convergent_plan_is_flagged_for_both_strategies() {
        let debts = vec![debt(1, "Payday", 1_000.0, 24.0, 15.0)];
        let comparison = compare(&debts, 0.0).expect("valid plan");
        assert!(!comparison.all_converged());
        assert!(comparison.avalanche.final_remaining() > 0.0);
        assert!(comparison.snowball.final_remaining() > 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_compare_is_idempotent_and_leaves_input_untouched(
            rows in vec((100u32..15_000, 0u32..3_000, 20u32..600), 1..5),
            extra in 0u32..800,
        ) {
            let debts = rows
                .iter()
                .enumerate()
                .map(|(i, &(bal, rate_bp, min))| {
                    debt(i as u32 + 1, &format!("d{i}"), bal as f64, rate_bp as f64 / 100.0, min as f64)
                })
                .collect::<Vec<_>>();
            let before = debts.clone();

            let first = compare(&debts, extra as f64).expect("valid plan");
            let second = compare(&debts, extra as f64).expect("valid plan");
            prop_assert_eq!(&debts, &before);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.avalanche.total_months <= crate::core::MAX_MONTHS);
            prop_assert!(first.snowball.total_months <= crate::core::MAX_MONTHS);
        }
    }
}
