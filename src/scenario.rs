//! Scenario runner for loan what-if comparisons
//!
//! Holds one base loan and runs it under many operator setups:
//! baseline against extra repayments, an offset balance against a
//! lower rate, intro offers against each other. Scenarios are plain
//! data and load from JSON, so comparison sets live next to the
//! portfolios they describe.
//!
//! # Example
//! ```ignore
//! let runner = ScenarioRunner::new(Loan::new(100_000.0, 0.1, 10.0));
//! let outcomes = runner.run_all(&scenarios)?;
//! let saved = interest_saving(&outcomes[0], &outcomes[1]);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{AmortizationResult, EngineConfig, LoanEngine, LoanTotals};
use crate::error::LoanError;
use crate::loan::Loan;
use crate::math;
use crate::operator::OperatorSpec;

/// A named operator setup to run the base loan under
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Label used in reports
    pub name: String,
    /// Overrides the runner's engine config when set
    pub config: Option<EngineConfig>,
    /// Operators registered on top of the base loan, in order
    pub operators: Vec<OperatorSpec>,
}

/// Outcome of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub totals: LoanTotals,
    /// Repayment periods until the schedule closed
    pub periods: u32,
    /// Per-period rate implied by total repaid over the schedule length
    pub effective_cost_rate: f64,
    pub result: AmortizationResult,
}

/// Pre-loaded runner: one base loan, many operator setups
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_loan: Loan,
    config: EngineConfig,
}

impl ScenarioRunner {
    /// Runner with the default engine configuration
    pub fn new(base_loan: Loan) -> Self {
        Self {
            base_loan,
            config: EngineConfig::default(),
        }
    }

    /// Replace the config used when a scenario does not carry its own
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn loan(&self) -> &Loan {
        &self.base_loan
    }

    fn build_engine(&self, scenario: &Scenario) -> LoanEngine {
        let config = scenario.config.clone().unwrap_or_else(|| self.config.clone());
        let mut engine = LoanEngine::new(self.base_loan.clone()).with_config(config);
        for spec in &scenario.operators {
            engine = engine.operator_spec(spec);
        }
        engine
    }

    /// Run a single scenario
    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioOutcome, LoanError> {
        let result = self.build_engine(scenario).calculate()?;
        let periods = result.periods();

        let effective_cost_rate = if self.base_loan.principal > 0.0
            && result.totals.repayment > 0.0
            && periods > 0
        {
            math::rate_of_return(self.base_loan.principal, result.totals.repayment, periods as f64)
        } else {
            0.0
        };

        Ok(ScenarioOutcome {
            name: scenario.name.clone(),
            totals: result.totals,
            periods,
            effective_cost_rate,
            result,
        })
    }

    /// Run many scenarios in parallel, preserving input order
    pub fn run_all(&self, scenarios: &[Scenario]) -> Result<Vec<ScenarioOutcome>, LoanError> {
        scenarios.par_iter().map(|scenario| self.run(scenario)).collect()
    }
}

/// Interest saved by `alternative` relative to `baseline`
pub fn interest_saving(baseline: &ScenarioOutcome, alternative: &ScenarioOutcome) -> f64 {
    baseline.totals.interest_paid - alternative.totals.interest_paid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{ExtraRepaymentOptions, OffsetOptions};

    fn test_loan() -> Loan {
        Loan::new(100_000.0, 0.1, 10.0)
    }

    fn baseline_scenario() -> Scenario {
        Scenario {
            name: "baseline".to_string(),
            ..Default::default()
        }
    }

    fn extra_repayment_scenario() -> Scenario {
        Scenario {
            name: "extra 100/month".to_string(),
            operators: vec![OperatorSpec::ExtraRepayment(ExtraRepaymentOptions {
                extra_repayment: 100.0,
                start_period: Some(13),
                ..Default::default()
            })],
            ..Default::default()
        }
    }

    #[test]
    fn test_extra_repayments_save_interest() {
        let runner = ScenarioRunner::new(test_loan());
        let baseline = runner.run(&baseline_scenario()).unwrap();
        let with_extra = runner.run(&extra_repayment_scenario()).unwrap();

        assert!(interest_saving(&baseline, &with_extra) > 0.0);
        assert!(with_extra.periods < baseline.periods);
    }

    #[test]
    fn test_effective_cost_rate_brackets() {
        let runner = ScenarioRunner::new(test_loan());
        let outcome = runner.run(&baseline_scenario()).unwrap();
        // positive, but below the 0.8333% contract rate since
        // repayments amortize the balance down over the term
        assert!(outcome.effective_cost_rate > 0.0);
        assert!(outcome.effective_cost_rate < 0.1 / 12.0);

        let free = ScenarioRunner::new(Loan::new(12_000.0, 0.0, 1.0));
        let outcome = free.run(&baseline_scenario()).unwrap();
        assert_eq!(outcome.effective_cost_rate, 0.0);
    }

    #[test]
    fn test_run_all_preserves_order() {
        let runner = ScenarioRunner::new(test_loan());
        let scenarios = vec![
            baseline_scenario(),
            extra_repayment_scenario(),
            Scenario {
                name: "offset".to_string(),
                operators: vec![OperatorSpec::Offset(OffsetOptions {
                    offset: 10_000.0,
                    ..Default::default()
                })],
                ..Default::default()
            },
        ];

        let outcomes = runner.run_all(&scenarios).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].name, "baseline");
        assert_eq!(outcomes[1].name, "extra 100/month");
        assert_eq!(outcomes[2].name, "offset");
        // both alternatives beat the baseline on interest
        assert!(outcomes[1].totals.interest_paid < outcomes[0].totals.interest_paid);
        assert!(outcomes[2].totals.interest_paid < outcomes[0].totals.interest_paid);
    }

    #[test]
    fn test_scenarios_load_from_json() {
        let raw = r#"[
            {"name": "baseline"},
            {"name": "offset", "operators": [{"type": "offset", "offset": 10000.0}]}
        ]"#;
        let scenarios: Vec<Scenario> = serde_json::from_str(raw).unwrap();
        let runner = ScenarioRunner::new(test_loan());
        let outcomes = runner.run_all(&scenarios).unwrap();
        assert!(outcomes[1].totals.interest_paid < outcomes[0].totals.interest_paid);
    }

    #[test]
    fn test_errors_propagate_from_engine() {
        let runner = ScenarioRunner::new(Loan::new(-1.0, 0.1, 10.0));
        assert!(runner.run(&baseline_scenario()).is_err());
    }
}
