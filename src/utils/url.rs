//! URL helpers for the chat server endpoint.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use vellum::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8080/v1"), "http://localhost:8080/v1");
/// assert_eq!(normalize_base_url("http://localhost:8080/v1///"), "http://localhost:8080/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use vellum::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8080/v1/", "/chat/completions"),
///     "http://localhost:8080/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrounding_whitespace_and_slashes_are_dropped() {
        assert_eq!(
            normalize_base_url("  https://api.example.com/v1/ \n"),
            "https://api.example.com/v1"
        );
        assert_eq!(normalize_base_url("https://api.example.com/"), "https://api.example.com");
    }

    #[test]
    fn endpoint_joins_with_a_single_slash() {
        for base in ["http://host/v1", "http://host/v1/", "http://host/v1//"] {
            for endpoint in ["chat/completions", "/chat/completions"] {
                assert_eq!(
                    construct_api_url(base, endpoint),
                    "http://host/v1/chat/completions"
                );
            }
        }
    }
}
