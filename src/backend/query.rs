//! Search query input and the match-query body sent to the backend.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use url::form_urlencoded;

/// Free-text query taken from the `q` parameter. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Accept the raw parameter, rejecting a missing or empty value.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some(text) if !text.is_empty() => Some(Self(text.to_string())),
            _ => None,
        }
    }

    /// Take the first `q` parameter of a raw query string.
    pub fn from_query_string(raw: Option<&str>) -> Option<Self> {
        let value = raw.and_then(|raw| {
            form_urlencoded::parse(raw.as_bytes())
                .find(|(key, _)| key == "q")
                .map(|(_, value)| value.into_owned())
        });
        Self::parse(value.as_deref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{"query": {"match": {<field>: <text>}}}`
#[derive(Debug, Serialize)]
pub struct SearchBody<'a> {
    query: MatchClause<'a>,
}

#[derive(Debug, Serialize)]
struct MatchClause<'a> {
    #[serde(rename = "match")]
    fields: BTreeMap<&'a str, &'a str>,
}

impl<'a> SearchBody<'a> {
    /// Single match query on `field`.
    pub fn match_query(field: &'a str, query: &'a SearchQuery) -> Self {
        Self {
            query: MatchClause {
                fields: BTreeMap::from([(field, query.as_str())]),
            },
        }
    }
}
