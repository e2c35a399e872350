//! Query/Filter Engine — full-field search and stable grouping.

use std::collections::HashMap;

use crate::normalize::ConfigEntry;

/// Case-insensitive substring search across every field of every entry.
///
/// A match in any single field is sufficient to include the whole entry;
/// the term is never AND-matched across fields.
pub fn search<'a>(entries: &'a [ConfigEntry], term: &str) -> Vec<&'a ConfigEntry> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|entry| {
            entry
                .fields()
                .iter()
                .any(|(_, value)| value.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Group entries by a derived key, preserving order.
///
/// Keys appear in first-seen order and entries keep their original relative
/// order within each group, so grouped presentation is stable across calls.
pub fn group_by<'a, T, F>(entries: impl IntoIterator<Item = &'a T>, key: F) -> Vec<(String, Vec<&'a T>)>
where
    F: Fn(&T) -> String,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&T>> = HashMap::new();
    for entry in entries {
        let k = key(entry);
        let slot = groups.entry(k.clone()).or_insert_with(|| {
            order.push(k);
            Vec::new()
        });
        slot.push(entry);
    }
    order
        .into_iter()
        .map(|k| {
            let members = groups.remove(&k).unwrap_or_default();
            (k, members)
        })
        .collect()
}
