use axum::http::Uri;

use crate::config::ParamNames;

/// Tenant and database UUID query parameters, read once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub tenant: Option<String>,
    pub database_uuid: Option<String>,
}

impl RequestParams {
    /// Blank values count as absent. A repeated parameter keeps its last value.
    ///
    /// Form decoding into string pairs is lenient: invalid escapes stay literal and
    /// pairs without `=` decode to an empty value, so any query yields parameters.
    #[must_use]
    pub fn from_uri(uri: &Uri, names: &ParamNames) -> Self {
        let Some(query) = uri.query() else {
            return Self::default();
        };
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();

        let last = |name: &str| {
            pairs
                .iter()
                .rev()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value)
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };
        Self {
            tenant: last(&names.tenant),
            database_uuid: last(&names.database_uuid),
        }
    }
}
