use serde::{Deserialize, Serialize};
use url::Url;

/// Multi-part public suffixes the registrable-domain calculation treats as a
/// single label. Anything not in this whitelist falls back to the
/// last-two-labels rule.
const MULTI_PART_SUFFIXES: &[&str] = &["co.uk", "com.au", "co.nz", "org.uk"];

/// Which URLs are allowed to be followed relative to the crawl's root URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Same scheme + host + port as the root.
    Subdomain,
    /// Same registrable domain as the root.
    #[default]
    Domain,
    /// Same last label (TLD) as the root.
    Tld,
    /// No restriction.
    All,
}

/// Returns the registrable domain of a host: its last two labels, or its
/// last three when the last two form one of the known multi-part suffixes.
#[must_use]
pub fn registrable_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return host.to_string();
    }
    let last_two = labels[labels.len() - 2..].join(".");
    if labels.len() >= 3 && MULTI_PART_SUFFIXES.contains(&last_two.as_str()) {
        labels[labels.len() - 3..].join(".")
    } else {
        last_two
    }
}

/// Computes the "base directory" a `stayInDir` check resolves against: a
/// base URL ending in `/` uses its path as-is; a base URL whose last segment
/// contains a `.` (i.e. names a file) uses that segment's parent.
#[must_use]
pub fn base_dir(base: &Url) -> String {
    let path = base.path();
    if path.ends_with('/') {
        return path.to_string();
    }
    match path.rsplit_once('/') {
        Some((dir, last)) if last.contains('.') => format!("{dir}/"),
        Some((dir, _)) => format!("{dir}/"),
        None => "/".to_string(),
    }
}

/// Decides whether `candidate` is in scope relative to `root` under the
/// given [`Scope`] and optional `stay_in_dir` restriction.
#[must_use]
pub fn in_scope(candidate: &Url, root: &Url, scope: Scope, stay_in_dir: bool) -> bool {
    let scope_ok = match scope {
        Scope::Subdomain => {
            candidate.scheme() == root.scheme()
                && candidate.host_str() == root.host_str()
                && candidate.port_or_known_default() == root.port_or_known_default()
        }
        Scope::Domain => match (candidate.host_str(), root.host_str()) {
            (Some(c), Some(r)) => registrable_domain(c) == registrable_domain(r),
            _ => false,
        },
        Scope::Tld => match (candidate.host_str(), root.host_str()) {
            (Some(c), Some(r)) => c.rsplit('.').next() == r.rsplit('.').next(),
            _ => false,
        },
        Scope::All => true,
    };

    if !scope_ok {
        return false;
    }

    if stay_in_dir {
        let dir = base_dir(root);
        candidate.path().starts_with(&dir)
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrable_domain_basic() {
        assert_eq!(registrable_domain("www.example.com"), "example.com");
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(registrable_domain("a.b.example.com"), "example.com");
    }

    #[test]
    fn registrable_domain_multi_part_suffix() {
        assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
        assert_eq!(registrable_domain("shop.example.com.au"), "example.com.au");
        assert_eq!(registrable_domain("a.example.co.nz"), "example.co.nz");
        assert_eq!(registrable_domain("a.example.org.uk"), "example.org.uk");
    }

    #[test]
    fn registrable_domain_unlisted_suffix_uses_last_two() {
        // co.jp is not in the whitelist, so only the last two labels count.
        assert_eq!(registrable_domain("www.example.co.jp"), "co.jp");
    }

    #[test]
    fn base_dir_of_trailing_slash() {
        let u = Url::parse("https://e.com/docs/").unwrap();
        assert_eq!(base_dir(&u), "/docs/");
    }

    #[test]
    fn base_dir_of_filename() {
        let u = Url::parse("https://e.com/docs/page.html").unwrap();
        assert_eq!(base_dir(&u), "/docs/");
    }

    #[test]
    fn scope_subdomain_requires_exact_origin() {
        let root = Url::parse("https://www.example.com/").unwrap();
        let same = Url::parse("https://www.example.com/a").unwrap();
        let other_sub = Url::parse("https://blog.example.com/a").unwrap();
        assert!(in_scope(&same, &root, Scope::Subdomain, false));
        assert!(!in_scope(&other_sub, &root, Scope::Subdomain, false));
    }

    #[test]
    fn scope_domain_allows_other_subdomains() {
        let root = Url::parse("https://www.example.com/").unwrap();
        let other_sub = Url::parse("https://blog.example.com/a").unwrap();
        let other_domain = Url::parse("https://other.com/a").unwrap();
        assert!(in_scope(&other_sub, &root, Scope::Domain, false));
        assert!(!in_scope(&other_domain, &root, Scope::Domain, false));
    }

    #[test]
    fn stay_in_dir_restricts_path() {
        let root = Url::parse("https://e.com/docs/guide.html").unwrap();
        let inside = Url::parse("https://e.com/docs/other.html").unwrap();
        let outside = Url::parse("https://e.com/blog/post.html").unwrap();
        assert!(in_scope(&inside, &root, Scope::Domain, true));
        assert!(!in_scope(&outside, &root, Scope::Domain, true));
    }
}
