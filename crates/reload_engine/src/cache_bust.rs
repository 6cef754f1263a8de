use url::Url;

/// Query parameter carrying the cache-busting stamp.
pub const CACHE_BUST_PARAM: &str = "reload_css";

/// Sets `reload_css=<stamp>` on `href`, keeping the path and every other query pair.
///
/// An existing `reload_css` pair is overwritten in place; repeated ones are dropped.
pub fn cache_busted_url(href: &str, stamp: i64) -> Result<String, url::ParseError> {
    let mut url = Url::parse(href)?;
    let stamp = stamp.to_string();

    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter_map(|(name, value)| {
            if name != CACHE_BUST_PARAM {
                return Some((name, value));
            }
            if replaced {
                return None;
            }
            replaced = true;
            Some((name, stamp.clone()))
        })
        .collect();
    if !replaced {
        pairs.push((CACHE_BUST_PARAM.to_string(), stamp));
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
    Ok(url.into())
}
