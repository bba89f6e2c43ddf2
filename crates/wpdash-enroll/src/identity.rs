//! Site identity derivation.
//!
//! The identity is the comment embedded in every converted key. It is a
//! best-effort canonical form of the site URL, not a validated hostname.

/// Role tag prepended to every derived identity.
pub const ROLE_TAG: &str = "wpdash@";

const SCHEMES: [&str; 2] = ["https://", "http://"];
const WWW: &str = "www.";

/// Derive the connection identity for a site URL.
///
/// Strips a leading `http://` or `https://` (any case) and a `www.` right
/// after it, then every trailing `/`, and prefixes [`ROLE_TAG`].
pub fn derive_identity(site_url: &str) -> String {
    let mut host = site_url;

    if let Some(rest) = strip_prefix_ignore_case(host, &SCHEMES) {
        host = strip_prefix_ignore_case(rest, &[WWW]).unwrap_or(rest);
    }

    format!("{}{}", ROLE_TAG, host.trim_end_matches('/'))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let head = s.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scheme_www_and_trailing_slash() {
        assert_eq!(
            derive_identity("https://www.example.com/"),
            "wpdash@example.com"
        );
        assert_eq!(derive_identity("http://example.com"), "wpdash@example.com");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(
            derive_identity("HTTPS://WWW.Example.com"),
            "wpdash@Example.com"
        );
        assert_eq!(derive_identity("Http://example.com//"), "wpdash@example.com");
    }

    #[test]
    fn test_keeps_path_and_port() {
        assert_eq!(
            derive_identity("https://example.com:8443/blog/"),
            "wpdash@example.com:8443/blog"
        );
    }

    #[test]
    fn test_www_only_stripped_after_scheme() {
        assert_eq!(derive_identity("www.example.com"), "wpdash@www.example.com");
        assert_eq!(derive_identity("https://wwwexample.com"), "wpdash@wwwexample.com");
    }

    #[test]
    fn test_malformed_input_passes_through() {
        assert_eq!(derive_identity("wordpress"), "wpdash@wordpress");
        assert_eq!(derive_identity(""), "wpdash@");
        assert_eq!(derive_identity("ftp://host/"), "wpdash@ftp://host");
        assert_eq!(derive_identity("https://"), "wpdash@");
    }

    #[test]
    fn test_non_ascii_does_not_panic() {
        assert_eq!(derive_identity("ñ"), "wpdash@ñ");
        assert_eq!(derive_identity("https://ünï.example/"), "wpdash@ünï.example");
    }

    #[test]
    fn test_deterministic() {
        for url in ["https://www.example.com/", "example.org", "http://a.b/c/"] {
            assert_eq!(derive_identity(url), derive_identity(url));
        }
    }
}
