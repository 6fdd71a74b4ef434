use crate::core::error::ServiceError;

const TOKEN_MARKER: &str = "<meta name=\"csrf-token\" content=";
const TOKEN_TERMINATOR: &str = "/>";

/// Pulls the CSRF token out of the landing page by plain text search, so any
/// markup around the meta tag is irrelevant.
pub fn extract_token(html: &str) -> Result<String, ServiceError> {
    let start = html
        .find(TOKEN_MARKER)
        .map(|idx| idx + TOKEN_MARKER.len())
        .ok_or(ServiceError::TokenNotFound)?;

    let rest = &html[start..];
    let end = rest
        .find(TOKEN_TERMINATOR)
        .ok_or(ServiceError::TokenNotFound)?;

    let token: String = rest[..end]
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();

    Ok(token.trim().to_string())
}
