//! File and folder names derived from task codes.

use std::collections::HashSet;

/// Make `name` usable as a single path component, on disk or inside a zip.
///
/// Separators and control characters become `_`; `""`, `.` and `..` become `_`.
pub fn safe_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// First of `base`, `base-2`, `base-3`, ... not in `used`.
pub fn unique_suffixed(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !used.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
