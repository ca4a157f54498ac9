//! Ordered first-present-wins lookup
//!
//! Identity claims and backend settings both arrive as loosely keyed maps
//! where several candidate keys may carry the same fact. The candidates are
//! tried in priority order and the first non-blank value wins.

/// Return the first non-blank value produced by `get` for `keys`, in order
///
/// Blank values (empty or whitespace-only) are skipped: a blank claim carries
/// no more information than a missing one.
///
/// # Examples
///
/// ```
/// use modelgate::shared::lookup::first_present;
/// use std::collections::HashMap;
///
/// let claims = HashMap::from([("upn", ""), ("email", "a@b.example")]);
/// let user = first_present(&["preferred_username", "upn", "email"], |k| {
///     claims.get(k).copied()
/// });
/// assert_eq!(user, Some("a@b.example"));
/// ```
pub fn first_present<'k, 'v, K, F>(keys: &'k [K], mut get: F) -> Option<&'v str>
where
    K: AsRef<str> + 'k,
    F: FnMut(&str) -> Option<&'v str>,
{
    keys.iter()
        .filter_map(|key| get(key.as_ref()))
        .find(|value| !value.trim().is_empty())
}

/// Like [`first_present`], but also reports which key produced the value
pub fn first_present_keyed<'k, 'v, F>(keys: &'k [&'k str], mut get: F) -> Option<(&'k str, &'v str)>
where
    F: FnMut(&str) -> Option<&'v str>,
{
    keys.iter().find_map(|key| {
        get(key)
            .filter(|value| !value.trim().is_empty())
            .map(|value| (*key, value))
    })
}
