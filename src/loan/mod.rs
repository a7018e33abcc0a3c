//! Loan parameters and portfolio loading

mod data;
pub mod loader;

pub use data::{Frequency, Loan, RepaymentType};
pub use loader::{load_portfolio, load_portfolio_from_reader, LoanRecord};
