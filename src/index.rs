use std::collections::HashMap;

use crate::types::strip_delimiters;
use crate::GrammarRule;

/// Name lookup in three steps: the dromedary-cased name, the same name in
/// `<...>` delimiters, then a scan over every rule comparing bare,
/// namespace-free names case-insensitively.
pub(crate) fn resolve<'g>(
    rules: &'g [GrammarRule],
    by_name: &HashMap<String, usize>,
    name: &str,
) -> Vec<&'g GrammarRule> {
    if name.is_empty() {
        return Vec::new();
    }

    let canonical = to_dromedary_case(name);

    if let Some(&idx) = by_name.get(&canonical) {
        return vec![&rules[idx]];
    }
    if let Some(&idx) = by_name.get(&format!("<{canonical}>")) {
        return vec![&rules[idx]];
    }

    let wanted = strip_delimiters(&canonical);
    rules
        .iter()
        .filter(|rule| local_name(strip_delimiters(&rule.name)).eq_ignore_ascii_case(wanted))
        .collect()
}

/// Lower-case the first character, keeping the rest as written.
pub(crate) fn to_dromedary_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strip every `namespace.` prefix.
fn local_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
