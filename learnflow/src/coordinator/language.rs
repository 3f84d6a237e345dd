//! Output language resolution.

/// Language used when nothing else is set.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Capitalizes the first character and lowercases the rest (`"hINDI"` → `"Hindi"`).
#[must_use]
pub fn normalize_language(language: &str) -> String {
    let trimmed = language.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => DEFAULT_LANGUAGE.to_string(),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Picks the first non-blank of `candidates`, normalized, or the default.
#[must_use]
pub fn first_language(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .find_map(|candidate| present(*candidate))
        .map_or_else(|| DEFAULT_LANGUAGE.to_string(), normalize_language)
}

/// Resolves the run language: override, then the space's stored value,
/// then the profile default, then English.
#[must_use]
pub fn resolve_language(
    override_language: Option<&str>,
    space_language: Option<&str>,
    profile_language: Option<&str>,
) -> String {
    first_language(&[override_language, space_language, profile_language])
}
