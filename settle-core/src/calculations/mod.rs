//! Settlement arithmetic for a calculator instance.
//!
//! [`row`] derives the per-line figures, [`aggregate`] folds them into the
//! totals and the settlement split between the two operators.

pub mod aggregate;
pub mod common;
pub mod row;

pub use aggregate::{AggregateResult, CalculatorAggregate, PrimaryRowView, SecondaryRowView};
pub use row::{RowEngine, RowResult};
