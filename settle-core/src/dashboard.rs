//! Cross-instance summary and combined digest.
//!
//! [`CalculatorBoard`] owns the fixed operator slots. Every change to one
//! instance reruns that instance's aggregate and report and then rebuilds
//! the [`Dashboard`], so the digest always reflects the latest figures of
//! every initialized slot. Slots that were never initialized are skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::format_currency;
use crate::calculations::{AggregateResult, CalculatorAggregate};
use crate::models::{CalculatorInstance, Catalog, ChangeEffect, FieldChange, OperatorId, OperatorSettings};
use crate::report::{InstanceReport, ReportFormatter};

/// Digest text shown while no instance has produced a report.
pub const DIGEST_PLACEHOLDER: &str = "各担当者のデータを入力してください";

/// Latest computed output of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceOutput {
    pub settings: OperatorSettings,
    pub aggregate: AggregateResult,
    pub report: InstanceReport,
}

impl InstanceOutput {
    /// Runs the full chain for one instance.
    pub fn compute(
        instance: &CalculatorInstance,
        settings: OperatorSettings,
    ) -> Self {
        let aggregate = CalculatorAggregate::new(settings).calculate(instance);
        let report = ReportFormatter::new(instance, &aggregate).render();
        Self {
            settings,
            aggregate,
            report,
        }
    }
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub operator_id: OperatorId,
    pub staff_name: String,
    pub total_quantity: i64,
    pub total_secondary_share: i64,
    pub send_amount_to_secondary: i64,
}

impl DashboardRow {
    fn new(
        instance: &CalculatorInstance,
        aggregate: &AggregateResult,
    ) -> Self {
        let staff_name = if instance.staff_name.is_empty() {
            format!("担当者{}", instance.operator_id)
        } else {
            instance.staff_name.clone()
        };
        Self {
            operator_id: instance.operator_id,
            staff_name,
            total_quantity: aggregate.total_quantity,
            total_secondary_share: aggregate.total_secondary_share,
            send_amount_to_secondary: aggregate.send_amount_to_secondary,
        }
    }

    pub fn quantity_display(&self) -> String {
        format!("{}本", self.total_quantity)
    }

    pub fn share_display(&self) -> String {
        format_currency(self.total_secondary_share)
    }

    pub fn send_display(&self) -> String {
        format_currency(self.send_amount_to_secondary)
    }
}

/// Side-by-side summary of every initialized instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub rows: Vec<DashboardRow>,
    pub digest: String,
}

impl Dashboard {
    /// Builds the summary from `(instance, output)` pairs in slot order.
    pub fn build<'a, I>(slots: I) -> Self
    where
        I: IntoIterator<Item = (&'a CalculatorInstance, &'a InstanceOutput)>,
    {
        let mut rows = Vec::new();
        let mut digest = String::new();

        for (instance, output) in slots {
            rows.push(DashboardRow::new(instance, &output.aggregate));

            let full = output.report.full();
            if !full.trim().is_empty() {
                digest.push_str(&full);
                digest.push_str("\n\n");
            }
        }

        let trimmed = digest.trim();
        let digest = if trimmed.is_empty() {
            DIGEST_PLACEHOLDER.to_string()
        } else {
            trimmed.to_string()
        };

        Self { rows, digest }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::build(std::iter::empty())
    }
}

#[derive(Debug, Clone)]
struct Slot {
    instance: CalculatorInstance,
    output: InstanceOutput,
}

/// The fixed set of operator slots and their derived dashboard.
#[derive(Debug, Clone)]
pub struct CalculatorBoard {
    catalog: Catalog,
    slots: [Option<Slot>; OperatorId::MAX as usize],
    dashboard: Dashboard,
}

impl CalculatorBoard {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            slots: Default::default(),
            dashboard: Dashboard::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Creates the instance for `id` if it does not exist yet and computes it.
    /// An existing instance keeps its values and is only recomputed.
    pub fn initialize(
        &mut self,
        id: OperatorId,
        today: NaiveDate,
        settings: OperatorSettings,
    ) {
        if self.slots[id.index()].is_some() {
            self.recompute(id, settings);
            return;
        }

        debug!(operator = %id, "initializing calculator instance");
        let instance = CalculatorInstance::new(id, &self.catalog, today);
        self.insert(instance, settings);
    }

    /// Places a fully built instance into its slot, replacing any previous one.
    pub fn insert(
        &mut self,
        instance: CalculatorInstance,
        settings: OperatorSettings,
    ) {
        let id = instance.operator_id;
        let output = InstanceOutput::compute(&instance, settings);
        self.slots[id.index()] = Some(Slot { instance, output });
        self.refresh_dashboard();
    }

    pub fn instance(
        &self,
        id: OperatorId,
    ) -> Option<&CalculatorInstance> {
        self.slots[id.index()].as_ref().map(|slot| &slot.instance)
    }

    pub fn output(
        &self,
        id: OperatorId,
    ) -> Option<&InstanceOutput> {
        self.slots[id.index()].as_ref().map(|slot| &slot.output)
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Applies one form edit and reruns the chain for that instance, then the
    /// dashboard. Returns `None` when the slot is not initialized.
    pub fn apply(
        &mut self,
        id: OperatorId,
        change: FieldChange,
        settings: OperatorSettings,
    ) -> Option<ChangeEffect> {
        let Some(slot) = self.slots[id.index()].as_mut() else {
            debug!(operator = %id, "change for uninitialized instance ignored");
            return None;
        };
        let effect = slot.instance.apply(change);
        if effect != ChangeEffect::Ignored {
            slot.output = InstanceOutput::compute(&slot.instance, settings);
            self.refresh_dashboard();
        }
        Some(effect)
    }

    /// Reruns one instance's chain with fresh settings. No-op for empty slots.
    pub fn recompute(
        &mut self,
        id: OperatorId,
        settings: OperatorSettings,
    ) {
        if let Some(slot) = self.slots[id.index()].as_mut() {
            slot.output = InstanceOutput::compute(&slot.instance, settings);
            self.refresh_dashboard();
        }
    }

    /// Reruns every initialized instance, fetching each one's settings.
    pub fn refresh_all<F>(
        &mut self,
        mut settings_for: F,
    ) where
        F: FnMut(OperatorId) -> OperatorSettings,
    {
        for slot in self.slots.iter_mut().flatten() {
            let settings = settings_for(slot.instance.operator_id);
            slot.output = InstanceOutput::compute(&slot.instance, settings);
        }
        self.refresh_dashboard();
    }

    /// Resets one instance's inputs. No-op for empty slots.
    pub fn clear(
        &mut self,
        id: OperatorId,
        today: NaiveDate,
        settings: OperatorSettings,
    ) {
        if let Some(slot) = self.slots[id.index()].as_mut() {
            slot.instance.clear(today);
            slot.output = InstanceOutput::compute(&slot.instance, settings);
            self.refresh_dashboard();
        }
    }

    fn refresh_dashboard(&mut self) {
        self.dashboard = Dashboard::build(
            self.slots
                .iter()
                .flatten()
                .map(|slot| (&slot.instance, &slot.output)),
        );
    }
}
