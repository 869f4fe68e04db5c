//! Query string for the catalog's DataTables search endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;

/// Rows requested per search.
pub const PAGE_SIZE: usize = 10;
/// Longest search value sent to the server, in characters.
pub const MAX_QUERY_LENGTH: usize = 100;

const COLUMN_KEYS: [[&str; 6]; 2] = [
    [
        "columns[0][data]",
        "columns[0][name]",
        "columns[0][searchable]",
        "columns[0][orderable]",
        "columns[0][search][value]",
        "columns[0][search][regex]",
    ],
    [
        "columns[1][data]",
        "columns[1][name]",
        "columns[1][searchable]",
        "columns[1][orderable]",
        "columns[1][search][value]",
        "columns[1][search][regex]",
    ],
];

/// Builds the DataTables server-side processing parameters for a search.
///
/// `draw` carries the character length of the untruncated query, the search
/// value itself is capped at [`MAX_QUERY_LENGTH`] characters, and `_` is the
/// cache-busting token.
///
/// # Examples
///
/// ```rust
/// use ird_catalog::query::search_parameters;
/// let parameters = search_parameters("BLES01234", 42);
/// assert!(parameters.contains(&("search[value]", "BLES01234".to_string())));
/// assert!(parameters.contains(&("draw", "9".to_string())));
/// ```
pub fn search_parameters(query: &str, cache_buster: u64) -> Vec<(&'static str, String)> {
    let value: String = query.chars().take(MAX_QUERY_LENGTH).collect();
    let mut parameters = vec![("draw", query.chars().count().to_string())];
    for (keys, data) in COLUMN_KEYS.iter().zip(["id", "title"]) {
        let [data_key, name, searchable, orderable, search_value, search_regex] = *keys;
        parameters.extend([
            (data_key, data.to_string()),
            (name, String::new()),
            (searchable, "true".to_string()),
            (orderable, "true".to_string()),
            (search_value, String::new()),
            (search_regex, "false".to_string()),
        ]);
    }
    parameters.extend([
        ("order[0][column]", "0".to_string()),
        ("order[0][dir]", "asc".to_string()),
        ("start", "0".to_string()),
        ("length", PAGE_SIZE.to_string()),
        ("search[value]", value),
        ("_", cache_buster.to_string()),
    ]);
    parameters
}

/// Source of strictly increasing cache-busting tokens.
///
/// Tokens are wall-clock ticks (100ns units since the Unix epoch), bumped
/// when the clock hasn't moved or has gone backwards since the last token.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicU64,
}

impl CacheBuster {
    pub fn next(&self) -> u64 {
        let now = u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 100).unwrap_or_default();
        // `fetch_update` only fails when the closure returns `None`.
        let bump = |last: u64| Some(now.max(last + 1));
        let previous = self.last.fetch_update(Ordering::SeqCst, Ordering::SeqCst, bump).unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(parameters: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        parameters.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_search_parameters() {
        let parameters = search_parameters("BLES01234", 638_000_000_000_000_000);
        assert_eq!(get(&parameters, "draw"), Some("9"));
        assert_eq!(get(&parameters, "columns[0][data]"), Some("id"));
        assert_eq!(get(&parameters, "columns[1][data]"), Some("title"));
        assert_eq!(get(&parameters, "columns[1][name]"), Some(""));
        assert_eq!(get(&parameters, "columns[0][searchable]"), Some("true"));
        assert_eq!(get(&parameters, "columns[1][orderable]"), Some("true"));
        assert_eq!(get(&parameters, "columns[0][search][regex]"), Some("false"));
        assert_eq!(get(&parameters, "order[0][column]"), Some("0"));
        assert_eq!(get(&parameters, "order[0][dir]"), Some("asc"));
        assert_eq!(get(&parameters, "start"), Some("0"));
        assert_eq!(get(&parameters, "length"), Some("10"));
        assert_eq!(get(&parameters, "search[value]"), Some("BLES01234"));
        assert_eq!(get(&parameters, "search[regex]"), None);
        assert_eq!(get(&parameters, "_"), Some("638000000000000000"));
        // 1 draw, 6 per column, 2 order, 2 paging, search value, cache buster.
        assert_eq!(parameters.len(), 19);
        // Every key appears once.
        let mut keys: Vec<_> = parameters.iter().map(|(k, _)| *k).collect();
        let count = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), count);
    }

    #[test]
    fn test_long_query_is_truncated_by_characters() {
        let query = "é".repeat(150);
        let parameters = search_parameters(&query, 1);
        assert_eq!(get(&parameters, "draw"), Some("150"));
        assert_eq!(get(&parameters, "search[value]").unwrap().chars().count(), MAX_QUERY_LENGTH);
    }

    #[test]
    fn test_cache_buster_is_strictly_increasing() {
        let buster = CacheBuster::default();
        let mut previous = buster.next();
        for _ in 0..1000 {
            let next = buster.next();
            assert!(next > previous);
            previous = next;
        }
    }
}
