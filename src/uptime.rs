use crate::diff::round1;
use crate::index::SnapshotIndex;
use crate::models::EntryStatus;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UptimeStat {
    pub live_pct: f64,
    pub samples: u32,
}

/// Per-provider availability across an ordered run of snapshots. A provider
/// is up in a snapshot when any of its entries is live; a snapshot where the
/// provider does not appear contributes no sample. Providers with zero
/// samples never make it into the map.
pub fn aggregate(snapshots: &[SnapshotIndex]) -> BTreeMap<String, UptimeStat> {
    let mut live_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut total_counts: BTreeMap<String, u32> = BTreeMap::new();

    for snapshot in snapshots {
        let mut live_in_snapshot: BTreeMap<&str, bool> = BTreeMap::new();
        for ((_, provider), entry) in snapshot.iter() {
            let live = live_in_snapshot.entry(provider).or_insert(false);
            if entry.status == EntryStatus::Live {
                *live = true;
            }
        }

        for (provider, live) in live_in_snapshot {
            *total_counts.entry(provider.to_string()).or_insert(0) += 1;
            if live {
                *live_counts.entry(provider.to_string()).or_insert(0) += 1;
            }
        }
    }

    total_counts
        .into_iter()
        .map(|(provider, samples)| {
            let live = live_counts.get(&provider).copied().unwrap_or(0);
            let stat = UptimeStat {
                live_pct: round1(f64::from(live) / f64::from(samples) * 100.0),
                samples,
            };
            (provider, stat)
        })
        .collect()
}
