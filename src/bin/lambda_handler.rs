//! AWS Lambda handler for loan quotes
//!
//! Accepts a loan plus an operator list as JSON and returns totals,
//! the period count and optionally the full schedule. Calculation
//! failures come back in the response's `error` field rather than
//! failing the invocation, so callers always get a well-formed body.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};

use loan_engine::{
    AmortizationRow, EngineConfig, Frequency, Loan, LoanEngine, LoanTotals, OperatorSpec,
    RepaymentType,
};

fn default_interest_rate() -> f64 {
    0.05
}

fn default_frequency() -> Frequency {
    Frequency::Month
}

fn default_true() -> bool {
    true
}

/// Input for a quote
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    /// Identifier echoed back on the response
    #[serde(default)]
    pub loan_id: u32,

    /// Amount borrowed
    pub principal: f64,

    /// Yearly nominal rate (default: 5%)
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,

    /// Term in years; 0 solves the term from `repayment`
    #[serde(default)]
    pub term: f64,

    /// Repayment per period; used when `term` is 0
    #[serde(default)]
    pub repayment: f64,

    /// Interest-only instead of principal-and-interest
    #[serde(default)]
    pub interest_only: bool,

    /// Repayment frequency (default: monthly)
    #[serde(default = "default_frequency")]
    pub repayment_frequency: Frequency,

    /// Savings mode: accumulate instead of amortize
    #[serde(default)]
    pub savings_mode: bool,

    /// Operators applied on top of the loan, in order
    #[serde(default)]
    pub operators: Vec<OperatorSpec>,

    /// Include the full schedule in the response (default: true)
    #[serde(default = "default_true")]
    pub include_schedule: bool,
}

/// Output of a quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub loan_id: u32,
    pub periods: u32,
    pub totals: LoanTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<AmortizationRow>>,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuoteResponse {
    fn failure(loan_id: u32, message: String, execution_time_ms: u64) -> Self {
        Self {
            loan_id,
            periods: 0,
            totals: LoanTotals::default(),
            schedule: None,
            execution_time_ms,
            error: Some(message),
        }
    }
}

async fn handler(event: LambdaEvent<QuoteRequest>) -> Result<QuoteResponse, Error> {
    let start = std::time::Instant::now();
    let request = event.payload;

    let loan = Loan {
        loan_id: request.loan_id,
        principal: request.principal,
        interest_rate: request.interest_rate,
        term: request.term,
        repayment: request.repayment,
        repayment_type: if request.interest_only {
            RepaymentType::InterestOnly
        } else {
            RepaymentType::PrincipalAndInterest
        },
        repayment_frequency: request.repayment_frequency,
        ..Default::default()
    };

    let config = EngineConfig {
        savings_mode: request.savings_mode,
        ..Default::default()
    };

    let mut engine = LoanEngine::new(loan).with_config(config);
    for spec in &request.operators {
        engine = engine.operator_spec(spec);
    }

    let result = match engine.calculate() {
        Ok(result) => result,
        Err(e) => {
            return Ok(QuoteResponse::failure(
                request.loan_id,
                e.to_string(),
                start.elapsed().as_millis() as u64,
            ));
        }
    };

    Ok(QuoteResponse {
        loan_id: result.loan_id,
        periods: result.periods(),
        totals: result.totals,
        schedule: if request.include_schedule {
            Some(result.rows)
        } else {
            None
        },
        execution_time_ms: start.elapsed().as_millis() as u64,
        error: None,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
