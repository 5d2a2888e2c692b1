//! Query parameter merging.

use indexmap::IndexMap;
use url::form_urlencoded;

/// Append `params` to `url` as an `application/x-www-form-urlencoded` query.
///
/// Joins with `&` when the URL already contains `?`, otherwise with `?`.
/// The URL itself is not parsed or re-encoded; an empty map returns it as is.
pub fn merge_query_params(url: &str, params: &IndexMap<String, String>) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    let separator = if url.contains('?') { '&' } else { '?' };

    format!("{url}{separator}{query}")
}
