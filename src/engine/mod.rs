//! Amortization engine: context building, the period loop and the
//! schedule output

mod context;
mod engine;
mod schedule;

pub use context::PeriodContext;
pub use engine::{EngineConfig, LoanEngine};
pub use schedule::{AmortizationResult, AmortizationRow, LoanTotals};
