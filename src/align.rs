use std::collections::BTreeMap;

/// Translate a category selection into another property's vocabulary.
///
/// Categories with an alias are replaced in place, the rest pass through.
/// If a replacement collides with a category already picked, the first
/// occurrence wins.
pub fn align(categories: &[String], aliases: &BTreeMap<String, String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len());
    for c in categories {
        let mapped = aliases.get(c).unwrap_or(c);
        if !out.contains(mapped) {
            out.push(mapped.clone());
        }
    }
    out
}
