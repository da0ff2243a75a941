//! Fixed-layout settlement text for copy-paste.
//!
//! Every instance produces two blocks. The primary block is addressed to the
//! staff member and ends with the amount to send; the secondary block lists
//! the AP/commission accruals for the counterparty. Numbers are printed as
//! plain integers, without thousands separators, and the separator rule,
//! the `本` unit and the full-width punctuation are literal tokens that
//! downstream readers match on.
//!
//! ```text
//! ―――――――――――
//! Tanaka
//! 2024-05-01：04本
//! 累計：4000
//! 詳細
//! 1000×4：2000
//! 経費：200
//! 合計：2200
//! 送り：1800
//! ―――――――――――
//! 1800送りでお願いします
//!
//! ―――――――――――
//! Sato
//! 1000×4（1）（150/250/400）
//! （TOTAL/400-200＝200）
//! ―――――――――――
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calculations::AggregateResult;
use crate::models::{CalculatorInstance, DATE_FORMAT};

/// Separator line framing both blocks.
pub const RULE: &str = "―――――――――――";

pub const STAFF_NAME_FALLBACK: &str = "担当者名";
pub const COUNTERPARTY_NAME_FALLBACK: &str = "AP担当者名";
pub const DATE_FALLBACK: &str = "日付";

/// Both report blocks of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceReport {
    pub primary: String,
    pub secondary: String,
}

impl InstanceReport {
    /// Primary block immediately followed by the secondary block.
    pub fn full(&self) -> String {
        let mut full = String::with_capacity(self.primary.len() + self.secondary.len());
        full.push_str(&self.primary);
        full.push_str(&self.secondary);
        full
    }
}

/// Renders an [`AggregateResult`] with the labels of its instance.
#[derive(Debug, Clone, Copy)]
pub struct ReportFormatter<'a> {
    instance: &'a CalculatorInstance,
    aggregate: &'a AggregateResult,
}

impl<'a> ReportFormatter<'a> {
    pub fn new(
        instance: &'a CalculatorInstance,
        aggregate: &'a AggregateResult,
    ) -> Self {
        Self {
            instance,
            aggregate,
        }
    }

    pub fn render(&self) -> InstanceReport {
        InstanceReport {
            primary: self.primary_block().to_string(),
            secondary: self.secondary_block().to_string(),
        }
    }

    pub fn primary_block(&self) -> PrimaryBlock<'a> {
        PrimaryBlock {
            instance: self.instance,
            aggregate: self.aggregate,
        }
    }

    pub fn secondary_block(&self) -> SecondaryBlock<'a> {
        SecondaryBlock {
            instance: self.instance,
            aggregate: self.aggregate,
        }
    }
}

/// Block addressed to the primary operator; ends with a newline.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryBlock<'a> {
    instance: &'a CalculatorInstance,
    aggregate: &'a AggregateResult,
}

impl fmt::Display for PrimaryBlock<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let agg = self.aggregate;

        writeln!(f, "{RULE}")?;
        writeln!(f, "{}", or_fallback(&self.instance.staff_name, STAFF_NAME_FALLBACK))?;
        match self.instance.settlement_date {
            Some(date) => write!(f, "{}", date.format(DATE_FORMAT))?,
            None => write!(f, "{DATE_FALLBACK}")?,
        }
        writeln!(f, "：{:02}本", agg.total_quantity)?;
        writeln!(f, "累計：{}", agg.cumulative_revenue)?;
        writeln!(f, "詳細")?;
        for row in agg.rows.iter().filter(|r| r.primary_quantity > 0) {
            writeln!(
                f,
                "{}×{}：{}",
                row.unit_price, row.primary_quantity, row.secondary_share
            )?;
        }
        writeln!(f, "経費：{}", agg.expense)?;
        writeln!(f, "合計：{}", agg.final_total_primary)?;
        writeln!(f, "送り：{}", agg.send_amount_to_secondary)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "{}送りでお願いします", agg.send_amount_to_secondary)
    }
}

/// Block addressed to the counterparty; starts with a blank line and has no
/// trailing newline.
#[derive(Debug, Clone, Copy)]
pub struct SecondaryBlock<'a> {
    instance: &'a CalculatorInstance,
    aggregate: &'a AggregateResult,
}

impl fmt::Display for SecondaryBlock<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let agg = self.aggregate;

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "{}",
            or_fallback(&self.instance.counterparty_name, COUNTERPARTY_NAME_FALLBACK)
        )?;
        for row in agg.contributing_rows() {
            writeln!(
                f,
                "{}×{}（{}）（{}/{}/{}）",
                row.unit_price,
                row.primary_quantity,
                row.other_quantity,
                row.ap_amount,
                row.commission,
                row.secondary_total()
            )?;
        }
        writeln!(
            f,
            "（TOTAL/{}-{}＝{}）",
            agg.combined_secondary_total, agg.expense, agg.net_secondary_after_expense
        )?;
        write!(f, "{RULE}")
    }
}

fn or_fallback<'a>(
    value: &'a str,
    fallback: &'a str,
) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
