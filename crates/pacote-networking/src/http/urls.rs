//! URL resolution helpers.

use std::collections::BTreeMap;

use url::Url;

/// URL query parameters.
pub type QueryParameters = BTreeMap<String, String>;

/// Resolve an endpoint against a base URL, then attach query parameters.
///
/// The base and the endpoint are joined with exactly one slash, whether or not
/// the base ends with one. An endpoint starting with `/` is absolute: it
/// replaces the whole path of the base. An empty query map adds no `?`.
///
/// ```ignore
/// let base = Url::parse("https://github.com")?;
/// let url = resolve_url(&base, "web-pacotes", &QueryParameters::new())?;
/// assert_eq!(url.as_str(), "https://github.com/web-pacotes");
/// ```
pub fn resolve_url(
    base: &Url,
    endpoint: &str,
    query: &QueryParameters,
) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut url = base.join(endpoint)?;
    append_query(&mut url, query);
    Ok(url)
}

/// Move `full`'s path and query onto `host`'s scheme, host and path.
///
/// `swap_url("https://github.com/abc", "https://google.com/def")` yields
/// `https://google.com/def/abc`.
pub fn swap_url(full: &Url, host: &Url) -> Url {
    let mut swapped = host.clone();
    let path = format!(
        "{}/{}",
        host.path().trim_end_matches('/'),
        full.path().trim_start_matches('/')
    );
    swapped.set_path(&path);
    swapped.set_query(full.query());
    swapped.set_fragment(None);
    swapped
}

pub(crate) fn append_query(url: &mut Url, query: &QueryParameters) {
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter());
    }
}
