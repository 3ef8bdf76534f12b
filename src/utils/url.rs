//! Helpers for building Gemini endpoint URLs from a configurable base.

/// Strip trailing slashes so endpoints can be appended with a single `/`.
///
/// ```
/// use gemchat::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://generativelanguage.googleapis.com/v1beta//"),
///     "https://generativelanguage.googleapis.com/v1beta"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join `base_url` and `endpoint` with exactly one slash between them.
///
/// ```
/// use gemchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url(
///         "https://generativelanguage.googleapis.com/v1beta/",
///         "/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
///     ),
///     "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

/// Check that a user-supplied base URL is usable and return its normalized form.
pub fn validate_base_url(base_url: &str) -> Result<String, String> {
    let normalized = normalize_base_url(base_url);
    let Some((scheme, rest)) = normalized.split_once("://") else {
        return Err(format!("'{base_url}' is not an absolute URL"));
    };
    if !matches!(scheme, "http" | "https") {
        return Err(format!("unsupported URL scheme '{scheme}'"));
    }
    if rest.is_empty() || rest.starts_with('/') {
        return Err(format!("'{base_url}' has no host"));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_paths_and_drops_trailing_slashes() {
        assert_eq!(normalize_base_url("http://localhost:8080"), "http://localhost:8080");
        assert_eq!(normalize_base_url("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(
            normalize_base_url("  https://proxy.example.com/gemini/v1beta/  "),
            "https://proxy.example.com/gemini/v1beta"
        );
    }

    #[test]
    fn construct_never_doubles_slashes() {
        for base in ["http://h/v1beta", "http://h/v1beta/", "http://h/v1beta///"] {
            for endpoint in ["models", "/models", "//models"] {
                assert_eq!(construct_api_url(base, endpoint), "http://h/v1beta/models");
            }
        }
    }

    #[test]
    fn construct_preserves_colon_and_query() {
        assert_eq!(
            construct_api_url("http://h", "models/gemini-3-pro-preview:streamGenerateContent?alt=sse"),
            "http://h/models/gemini-3-pro-preview:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn validate_accepts_http_and_https() {
        assert_eq!(
            validate_base_url("https://generativelanguage.googleapis.com/v1beta/"),
            Ok("https://generativelanguage.googleapis.com/v1beta".to_string())
        );
        assert_eq!(
            validate_base_url("http://127.0.0.1:9000"),
            Ok("http://127.0.0.1:9000".to_string())
        );
    }

    #[test]
    fn validate_rejects_relative_and_foreign_urls() {
        assert!(validate_base_url("generativelanguage.googleapis.com").is_err());
        assert!(validate_base_url("ftp://example.com").is_err());
        assert!(validate_base_url("https://").is_err());
        assert!(validate_base_url("https:///v1beta").is_err());
    }
}
