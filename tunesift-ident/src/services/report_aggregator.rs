//! Report aggregation
//!
//! Merges the per-provider hit maps (in provider order) and the leftover
//! working set into one [`Report`]. Pure and deterministic: the same inputs
//! always give the same report.
//!
//! Overlapping membership means the orchestrator broke its own rules, so it
//! is reported as [`IdentError::Invariant`] rather than handled.

use crate::error::IdentError;
use crate::models::{Identification, Item, ProviderHits, Report, Unresolved};
use std::collections::{HashMap, HashSet};

pub fn aggregate(hit_maps: &[ProviderHits], leftovers: &[Unresolved]) -> Result<Report, IdentError> {
    let mut owners: HashMap<&Item, &str> = HashMap::new();
    let mut hits = Vec::new();

    for map in hit_maps {
        for (item, payload) in &map.hits {
            if let Some(previous) = owners.insert(item, map.provider.as_str()) {
                return Err(IdentError::Invariant(format!(
                    "{} hit by both '{}' and '{}'",
                    item, previous, map.provider
                )));
            }
            hits.push(Identification {
                item: item.clone(),
                provider: map.provider.clone(),
                payload: payload.clone(),
            });
        }
    }

    let mut unresolved_seen: HashSet<&Item> = HashSet::new();
    for leftover in leftovers {
        if let Some(provider) = owners.get(&leftover.item) {
            return Err(IdentError::Invariant(format!(
                "{} is both hit by '{}' and unresolved",
                leftover.item, provider
            )));
        }
        if !unresolved_seen.insert(&leftover.item) {
            return Err(IdentError::Invariant(format!(
                "{} listed as unresolved twice",
                leftover.item
            )));
        }
    }

    Ok(Report {
        hits,
        unresolved: leftovers.to_vec(),
    })
}

/// Check that `report` covers exactly the items of `original`
pub fn verify_partition(original: &[Item], report: &Report) -> Result<(), IdentError> {
    let expected: HashSet<&Item> = original.iter().collect();
    let mut covered: HashSet<&Item> = HashSet::new();

    for item in report.items() {
        if !expected.contains(item) {
            return Err(IdentError::Invariant(format!(
                "{} appears in the report but was never submitted",
                item
            )));
        }
        if !covered.insert(item) {
            return Err(IdentError::Invariant(format!("{} reported twice", item)));
        }
    }

    if let Some(missing) = original.iter().find(|item| !covered.contains(item)) {
        return Err(IdentError::Invariant(format!(
            "{} missing from the report",
            missing
        )));
    }

    Ok(())
}
