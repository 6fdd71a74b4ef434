use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One authenticated session with the occupancy service.
///
/// The CSRF token is fixed at construction. Cookies only ever grow or get
/// overwritten by key; a session is thrown away rather than reset once the
/// service reports it expired.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    cookies: BTreeMap<String, String>,
    established_at: DateTime<Utc>,
}

impl Session {
    pub fn new<I>(token: impl Into<String>, cookies: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            token: token.into(),
            cookies: cookies.into_iter().collect(),
            established_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.established_at
    }

    pub fn merge_cookies<I>(&mut self, cookies: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.cookies.extend(cookies);
    }

    /// Value for a `Cookie` request header, `None` when no cookies are held.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");

        Some(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_overwrites_by_key_and_keeps_the_rest() {
        let mut session = Session::new(
            "tok",
            cookies(&[("laravel_session", "old"), ("XSRF-TOKEN", "x1")]),
        );

        session.merge_cookies(cookies(&[("laravel_session", "new"), ("extra", "1")]));

        assert_eq!(session.token(), "tok");
        assert_eq!(session.cookies().len(), 3);
        assert_eq!(session.cookies()["laravel_session"], "new");
        assert_eq!(session.cookies()["XSRF-TOKEN"], "x1");
        assert_eq!(session.cookies()["extra"], "1");
    }

    #[test]
    fn test_merge_empty_is_noop() {
        let mut session = Session::new("tok", cookies(&[("a", "1")]));
        session.merge_cookies(Vec::new());
        assert_eq!(session.cookies().len(), 1);
    }

    #[test]
    fn test_cookie_header() {
        let session = Session::new("tok", cookies(&[("b", "2"), ("a", "1")]));
        assert_eq!(session.cookie_header().as_deref(), Some("a=1; b=2"));

        let empty = Session::new("tok", Vec::new());
        assert!(empty.cookie_header().is_none());
    }

    #[test]
    fn test_age_is_non_negative() {
        let session = Session::new("tok", Vec::new());
        assert!(session.age() >= chrono::Duration::zero());
        assert!(session.established_at() <= Utc::now());
    }
}
