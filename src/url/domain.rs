use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use arachne::url::extract_domain;
///
/// let url = Url::parse("https://Blog.Example.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host matches a domain pattern
///
/// `"example.com"` matches only that host. `"*.example.com"` matches the bare
/// domain and any subdomain at any depth.
///
/// # Examples
///
/// ```
/// use arachne::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .map_or(false, |prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Strips a leading `www.` label
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Returns the host without its last label (`example.co` for `example.com`)
///
/// Hosts without a dot are returned unchanged.
pub fn without_tld(host: &str) -> &str {
    match host.rfind('.') {
        Some(idx) => &host[..idx],
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        let url = Url::parse("https://blog.example.com/post?q=1#top").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_domain_lowercases_and_drops_port() {
        let url = Url::parse("http://EXAMPLE.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_ip_host() {
        let url = Url::parse("http://127.0.0.1:3000/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_exact_pattern() {
        assert!(matches_wildcard("example.com", "example.com"));
        assert!(!matches_wildcard("example.com", "blog.example.com"));
        assert!(!matches_wildcard("blog.example.com", "example.com"));
    }

    #[test]
    fn test_wildcard_pattern() {
        assert!(matches_wildcard("*.example.com", "example.com"));
        assert!(matches_wildcard("*.example.com", "www.example.com"));
        assert!(matches_wildcard("*.example.com", "deep.nested.example.com"));
    }

    #[test]
    fn test_wildcard_rejects_lookalikes() {
        assert!(!matches_wildcard("*.example.com", "notexample.com"));
        assert!(!matches_wildcard("*.example.com", "example.com.evil.org"));
        assert!(!matches_wildcard("*.example.com", ""));
    }

    #[test]
    fn test_multi_label_suffix() {
        assert!(matches_wildcard("*.co.uk", "example.co.uk"));
        assert!(!matches_wildcard("*.co.uk", "co.jp"));
    }

    #[test]
    fn test_strip_www() {
        assert_eq!(strip_www("www.example.com"), "example.com");
        assert_eq!(strip_www("example.com"), "example.com");
        assert_eq!(strip_www("wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn test_without_tld() {
        assert_eq!(without_tld("example.com"), "example");
        assert_eq!(without_tld("blog.example.org"), "blog.example");
        assert_eq!(without_tld("localhost"), "localhost");
    }
}
