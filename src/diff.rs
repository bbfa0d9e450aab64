use crate::index::SnapshotIndex;
use crate::models::EntryStatus;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Rounded price moves must exceed this percentage to be reported.
pub const PRICE_THRESHOLD_PCT: f64 = 1.0;
/// Rounded throughput moves must exceed this percentage to be reported.
pub const SPEED_THRESHOLD_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelChange {
    pub model: String,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderChange {
    pub model: String,
    pub provider: String,
    pub change: ChangeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChange {
    pub model: String,
    pub provider: String,
    pub field: PriceField,
    pub old: f64,
    pub new: f64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedChange {
    pub model: String,
    pub provider: String,
    pub old: f64,
    pub new: f64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub model: String,
    pub provider: String,
    pub old: EntryStatus,
    pub new: EntryStatus,
}

#[derive(Debug, Default, Serialize)]
pub struct DiffResult {
    pub models_added: Vec<ModelChange>,
    pub models_removed: Vec<ModelChange>,
    pub provider_changes: Vec<ProviderChange>,
    pub price_changes: Vec<PriceChange>,
    pub speed_changes: Vec<SpeedChange>,
    pub status_changes: Vec<StatusChange>,
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage change rounded to one decimal. A zero base has no defined
/// percentage, so it yields nothing rather than an infinite move.
fn pct_change(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 {
        return None;
    }
    Some(round1((new - old) / old.abs() * 100.0))
}

fn group_by_model(keys: &BTreeSet<(String, String)>) -> BTreeMap<String, Vec<String>> {
    let mut models: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (model, provider) in keys {
        models.entry(model.clone()).or_default().push(provider.clone());
    }
    models
}

/// Structural and quantitative delta between the first and last snapshot of
/// a period. Every output list is sorted by (model, provider), so identical
/// inputs always produce identical output.
pub fn diff(first: &SnapshotIndex, last: &SnapshotIndex) -> DiffResult {
    let first_keys: BTreeSet<(String, String)> = first.keys().cloned().collect();
    let last_keys: BTreeSet<(String, String)> = last.keys().cloned().collect();

    let first_models = group_by_model(&first_keys);
    let last_models = group_by_model(&last_keys);

    let mut result = DiffResult::default();

    // A model counts as added or removed only when it is entirely absent
    // from one side, regardless of which providers serve it.
    for (model, providers) in &last_models {
        if !first_models.contains_key(model) {
            result.models_added.push(ModelChange {
                model: model.clone(),
                providers: providers.clone(),
            });
        }
    }
    for (model, providers) in &first_models {
        if !last_models.contains_key(model) {
            result.models_removed.push(ModelChange {
                model: model.clone(),
                providers: providers.clone(),
            });
        }
    }

    for (model, provider) in last_keys.difference(&first_keys) {
        result.provider_changes.push(ProviderChange {
            model: model.clone(),
            provider: provider.clone(),
            change: ChangeKind::Added,
        });
    }
    for (model, provider) in first_keys.difference(&last_keys) {
        result.provider_changes.push(ProviderChange {
            model: model.clone(),
            provider: provider.clone(),
            change: ChangeKind::Removed,
        });
    }

    for (model, provider) in first_keys.intersection(&last_keys) {
        let (Some(fe), Some(le)) = (first.get(model, provider), last.get(model, provider)) else {
            continue;
        };

        for (field, old, new) in [
            (PriceField::Input, fe.input_price_per_token, le.input_price_per_token),
            (PriceField::Output, fe.output_price_per_token, le.output_price_per_token),
        ] {
            let (Some(old), Some(new)) = (old, new) else {
                continue;
            };
            if old == new {
                continue;
            }
            if let Some(pct) = pct_change(old, new) {
                if pct.abs() > PRICE_THRESHOLD_PCT {
                    result.price_changes.push(PriceChange {
                        model: model.clone(),
                        provider: provider.clone(),
                        field,
                        old,
                        new,
                        pct,
                    });
                }
            }
        }

        if let (Some(old), Some(new)) = (fe.tokens_per_second, le.tokens_per_second) {
            if old != new {
                if let Some(pct) = pct_change(old, new) {
                    if pct.abs() > SPEED_THRESHOLD_PCT {
                        result.speed_changes.push(SpeedChange {
                            model: model.clone(),
                            provider: provider.clone(),
                            old,
                            new,
                            pct,
                        });
                    }
                }
            }
        }

        if fe.status != le.status {
            result.status_changes.push(StatusChange {
                model: model.clone(),
                provider: provider.clone(),
                old: fe.status,
                new: le.status,
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnapshotEntry;

    fn entry(
        model: &str,
        provider: &str,
        status: EntryStatus,
        tokens: Option<f64>,
        in_price: Option<f64>,
        out_price: Option<f64>,
    ) -> SnapshotEntry {
        SnapshotEntry {
            model: model.to_string(),
            provider: provider.to_string(),
            status,
            tokens_per_second: tokens,
            first_token_latency_ms: Some(50.0),
            input_price_per_token: in_price,
            output_price_per_token: out_price,
        }
    }

    fn live(model: &str, provider: &str) -> SnapshotEntry {
        entry(model, provider, EntryStatus::Live, Some(100.0), Some(1.0), Some(2.0))
    }

    fn index(entries: &[SnapshotEntry]) -> SnapshotIndex {
        SnapshotIndex::build(entries)
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let snap = index(&[live("m1", "p1"), live("m1", "p2"), live("m2", "p1")]);
        let same = index(&[live("m1", "p1"), live("m1", "p2"), live("m2", "p1")]);
        let result = diff(&snap, &same);
        assert!(result.models_added.is_empty());
        assert!(result.models_removed.is_empty());
        assert!(result.provider_changes.is_empty());
        assert!(result.price_changes.is_empty());
        assert!(result.speed_changes.is_empty());
        assert!(result.status_changes.is_empty());
    }

    #[test]
    fn model_added_only_when_absent_from_first_snapshot() {
        let first = index(&[live("m1", "p1")]);
        let last = index(&[live("m1", "p1"), live("m1", "p2"), live("m2", "p1")]);
        let result = diff(&first, &last);

        // m1 gained a provider but is not a new model.
        assert_eq!(
            result.models_added,
            vec![ModelChange {
                model: "m2".into(),
                providers: vec!["p1".into()],
            }]
        );
        assert!(result.models_removed.is_empty());
        assert_eq!(result.provider_changes.len(), 2);
        assert!(result
            .provider_changes
            .iter()
            .all(|c| c.change == ChangeKind::Added));
    }

    #[test]
    fn model_removed_carries_its_provider_set_from_first_snapshot() {
        let first = index(&[live("m1", "p1"), live("m2", "p1"), live("m2", "p2")]);
        let last = index(&[live("m1", "p1")]);
        let result = diff(&first, &last);

        assert_eq!(
            result.models_removed,
            vec![ModelChange {
                model: "m2".into(),
                providers: vec!["p1".into(), "p2".into()],
            }]
        );
        assert_eq!(result.provider_changes.len(), 2);
        assert!(result
            .provider_changes
            .iter()
            .all(|c| c.change == ChangeKind::Removed));
    }

    #[test]
    fn provider_changes_list_additions_before_removals_sorted() {
        let first = index(&[live("m1", "p1"), live("m2", "p1")]);
        let last = index(&[live("m1", "p2"), live("m2", "p1")]);
        let result = diff(&first, &last);

        assert_eq!(result.provider_changes.len(), 2);
        assert_eq!(result.provider_changes[0].change, ChangeKind::Added);
        assert_eq!(result.provider_changes[0].provider, "p2");
        assert_eq!(result.provider_changes[1].change, ChangeKind::Removed);
        assert_eq!(result.provider_changes[1].provider, "p1");
        // m1 persists; provider churn alone never classifies a model.
        assert!(result.models_added.is_empty());
        assert!(result.models_removed.is_empty());
    }

    #[test]
    fn price_change_at_exactly_one_percent_is_not_reported() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, None, Some(100.0), None)]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, None, Some(101.0), None)]);
        assert!(diff(&first, &last).price_changes.is_empty());
    }

    #[test]
    fn price_change_above_one_percent_is_reported() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, None, Some(100.0), None)]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, None, Some(101.1), None)]);
        let result = diff(&first, &last);
        assert_eq!(result.price_changes.len(), 1);
        let change = &result.price_changes[0];
        assert_eq!(change.field, PriceField::Input);
        assert_eq!(change.pct, 1.1);
    }

    #[test]
    fn speed_change_at_exactly_ten_percent_is_not_reported() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, Some(100.0), None, None)]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, Some(110.0), None, None)]);
        assert!(diff(&first, &last).speed_changes.is_empty());
    }

    #[test]
    fn speed_change_above_ten_percent_is_reported() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, Some(100.0), None, None)]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, Some(110.1), None, None)]);
        let result = diff(&first, &last);
        assert_eq!(result.speed_changes.len(), 1);
        assert_eq!(result.speed_changes[0].pct, 10.1);
    }

    #[test]
    fn zero_base_produces_no_quantitative_change() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, Some(0.0), Some(0.0), Some(0.0))]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, Some(50.0), Some(5.0), Some(9.0))]);
        let result = diff(&first, &last);
        assert!(result.price_changes.is_empty());
        assert!(result.speed_changes.is_empty());
    }

    #[test]
    fn missing_values_produce_no_quantitative_change() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, None, None, Some(2.0))]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, Some(90.0), Some(1.0), None)]);
        let result = diff(&first, &last);
        assert!(result.price_changes.is_empty());
        assert!(result.speed_changes.is_empty());
    }

    #[test]
    fn status_change_is_unconditional() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, None, None, None)]);
        let last = index(&[entry("m1", "p1", EntryStatus::Staging, None, None, None)]);
        let result = diff(&first, &last);
        assert_eq!(
            result.status_changes,
            vec![StatusChange {
                model: "m1".into(),
                provider: "p1".into(),
                old: EntryStatus::Live,
                new: EntryStatus::Staging,
            }]
        );
    }

    #[test]
    fn input_price_change_sorts_before_output_for_same_key() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, None, Some(1.0), Some(2.0))]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, None, Some(2.0), Some(4.0))]);
        let result = diff(&first, &last);
        assert_eq!(result.price_changes.len(), 2);
        assert_eq!(result.price_changes[0].field, PriceField::Input);
        assert_eq!(result.price_changes[1].field, PriceField::Output);
        assert_eq!(result.price_changes[0].pct, 100.0);
    }

    #[test]
    fn negative_price_change_keeps_sign() {
        let first = index(&[entry("m1", "p1", EntryStatus::Live, None, None, Some(2.0))]);
        let last = index(&[entry("m1", "p1", EntryStatus::Live, None, None, Some(1.0))]);
        let result = diff(&first, &last);
        assert_eq!(result.price_changes.len(), 1);
        assert_eq!(result.price_changes[0].pct, -50.0);
        assert_eq!(result.price_changes[0].old, 2.0);
        assert_eq!(result.price_changes[0].new, 1.0);
    }

    #[test]
    fn round1_rounds_to_one_decimal() {
        assert_eq!(round1(66.666_666), 66.7);
        assert_eq!(round1(-50.0), -50.0);
        assert_eq!(round1(10.04), 10.0);
    }
}
