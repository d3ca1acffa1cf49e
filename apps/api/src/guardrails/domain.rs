//! Domain normalization and apply-URL allowlist matching.
//!
//! Job boards issue per-tenant subdomains (`boards.greenhouse.io`,
//! `jobs.lever.co`), so matching is subdomain-inclusive: allowlisting
//! `greenhouse.io` covers every customer board under it.

use url::Url;

/// Hosts permitted for auto-apply when a user has not configured their own
/// allowlist. Common job boards and applicant-tracking platforms.
pub const DEFAULT_ALLOWED_APPLY_DOMAINS: [&str; 6] = [
    "linkedin.com",
    "indeed.com",
    "greenhouse.io",
    "lever.co",
    "workday.com",
    "ashbyhq.com",
];

/// Reduces a raw URL or host string to a canonical host: lowercase, scheme
/// and `www.` stripped, truncated at the first `/`, and limited to
/// `[a-z0-9.-]`. Total and idempotent; garbage input yields an empty or
/// partial string, never an error.
pub fn normalize_domain(input: &str) -> String {
    let lower = input.trim().to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.split('/').next().unwrap_or("");
    rest.chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// Parses `url` as an absolute URL and returns its normalized host.
/// `None` when the input is not parseable or has no host; this is the only
/// failure path and it is an `Option`, not an error.
pub fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let normalized = normalize_domain(host);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// True when `host` equals a normalized allowlist entry or is a strict
/// subdomain of one. An empty allowlist matches nothing.
pub fn host_matches_allowlist(host: &str, allowlist: &[String]) -> bool {
    allowlist.iter().any(|entry| {
        let entry = normalize_domain(entry);
        !entry.is_empty() && (host == entry || host.ends_with(&format!(".{entry}")))
    })
}

/// Outcome of checking an apply URL against an allowlist. `host` is the
/// resolved host when the URL parsed, even if it failed the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyUrlCheck {
    pub ok: bool,
    pub host: Option<String>,
}

/// Resolves the apply URL's host and checks it against the allowlist.
/// Malformed URLs are always blocked, never silently allowed.
pub fn is_apply_url_allowed(url: &str, allowlist: &[String]) -> ApplyUrlCheck {
    match extract_host(url) {
        None => ApplyUrlCheck {
            ok: false,
            host: None,
        },
        Some(host) => {
            let ok = host_matches_allowlist(&host, allowlist);
            ApplyUrlCheck {
                ok,
                host: Some(host),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_domain("https://www.LinkedIn.com/jobs/view/123"),
            "linkedin.com"
        );
        assert_eq!(normalize_domain("http://Indeed.com"), "indeed.com");
        assert_eq!(normalize_domain("boards.greenhouse.io"), "boards.greenhouse.io");
    }

    #[test]
    fn test_normalize_drops_invalid_chars() {
        assert_eq!(normalize_domain("ex ample!.com"), "example.com");
        assert_eq!(normalize_domain("???"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_domain("https://www.Jobs.Lever.co/acme");
        assert_eq!(normalize_domain(&once), once);
    }

    #[test]
    fn test_extract_host_on_valid_url() {
        assert_eq!(
            extract_host("https://www.linkedin.com/jobs/view/123"),
            Some("linkedin.com".to_string())
        );
        assert_eq!(
            extract_host("https://jobs.lever.co/company/123"),
            Some("jobs.lever.co".to_string())
        );
    }

    #[test]
    fn test_extract_host_on_non_url() {
        assert_eq!(extract_host("not a url"), None);
        assert_eq!(extract_host(""), None);
        assert_eq!(extract_host("/relative/path"), None);
    }

    #[test]
    fn test_subdomain_matches_parent_entry() {
        assert!(host_matches_allowlist(
            "boards.greenhouse.io",
            &list(&["greenhouse.io"])
        ));
        assert!(host_matches_allowlist("lever.co", &list(&["lever.co"])));
    }

    #[test]
    fn test_unrelated_host_does_not_match() {
        assert!(!host_matches_allowlist("example.com", &list(&["greenhouse.io"])));
        // suffix without the dot boundary must not match
        assert!(!host_matches_allowlist("evilgreenhouse.io", &list(&["greenhouse.io"])));
    }

    #[test]
    fn test_empty_allowlist_matches_nothing() {
        assert!(!host_matches_allowlist("linkedin.com", &[]));
    }

    #[test]
    fn test_allowlist_entries_are_normalized() {
        assert!(host_matches_allowlist(
            "jobs.lever.co",
            &list(&["https://www.Lever.co/postings"])
        ));
    }

    #[test]
    fn test_apply_url_allowed() {
        let check = is_apply_url_allowed("https://jobs.lever.co/company/123", &list(&["lever.co"]));
        assert!(check.ok);
        assert_eq!(check.host.as_deref(), Some("jobs.lever.co"));
    }

    #[test]
    fn test_apply_url_blocked_off_list() {
        let check = is_apply_url_allowed("https://example.com/apply", &list(&["lever.co"]));
        assert!(!check.ok);
        assert_eq!(check.host.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_apply_url_blocked_when_malformed() {
        let check = is_apply_url_allowed("not a url", &list(&["lever.co"]));
        assert!(!check.ok);
        assert_eq!(check.host, None);
    }

    #[test]
    fn test_default_domains_cover_linkedin() {
        let defaults: Vec<String> = DEFAULT_ALLOWED_APPLY_DOMAINS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let check = is_apply_url_allowed("https://www.linkedin.com/jobs/view/123456", &defaults);
        assert!(check.ok);
        assert_eq!(check.host.as_deref(), Some("linkedin.com"));
    }
}
