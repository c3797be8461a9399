//! Fixed exclude-list patterns for resources that should never be saved
//! (SPEC_FULL §4.6.2), even though they may still be visible in the DOM.

use once_cell::sync::Lazy;
use regex::RegexSet;

/// One regex (case-insensitive) per excluded category, in the order they're
/// checked. `reason_for` returns the matching category's diagnostic label.
static PATTERNS: Lazy<(RegexSet, Vec<&'static str>)> = Lazy::new(|| {
    let entries: &[(&str, &str)] = &[
        ("source map", r"(?i)\.map(\?|$)"),
        ("well-known", r"(?i)/\.well-known/"),
        ("cloudflare telemetry", r"(?i)/cdn-cgi/(rum|beacon|trace|challenge-platform)|cloudflareinsights\.com"),
        (
            "analytics / tag manager",
            r"(?i)google-analytics|googletagmanager|doubleclick|gtag/js|\bga\.js\b|analytics\.js|gtm\.js",
        ),
        (
            "social pixel",
            r"(?i)connect\.facebook\.net|platform\.twitter\.com/widgets|t\.co/i/adsct|linkedin\.com/px",
        ),
        (
            "tracking / observability",
            r"(?i)hotjar|mixpanel|segment|amplitude|heap|sentry|logrocket|fullstory|newrelic|datadog",
        ),
        (
            "chat widget",
            r"(?i)intercom|drift|hubspot|zendesk|crisp|tawk\.to|livechat",
        ),
        ("generic beacon/collect endpoint", r"(?i)/beacon/|/collect\?|/pixel\?|/track\?|/event\?|/log\?"),
        ("generic API / socket endpoint", r"(?i)/api/v\d+/|graphql|webhook|socket\.io|/ws/"),
    ];

    let set = RegexSet::new(entries.iter().map(|(_, p)| *p)).expect("static exclude patterns compile");
    let reasons = entries.iter().map(|(r, _)| *r).collect();
    (set, reasons)
});

/// Returns the diagnostic reason a URL was excluded, if it matches any
/// built-in exclude-list category.
#[must_use]
pub fn excluded_reason(url: &str) -> Option<&'static str> {
    let (set, reasons) = &*PATTERNS;
    set.matches(url).into_iter().next().map(|i| reasons[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_source_maps() {
        assert_eq!(excluded_reason("https://e.com/app.js.map"), Some("source map"));
    }

    #[test]
    fn flags_analytics() {
        assert!(excluded_reason("https://www.google-analytics.com/analytics.js").is_some());
    }

    #[test]
    fn leaves_ordinary_assets_alone() {
        assert_eq!(excluded_reason("https://e.com/img/logo.png"), None);
    }
}
