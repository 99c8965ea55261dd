//! Common types and utilities for the console API

use serde::{Deserialize, Serialize};
use url::Url;

use super::endpoint::append_query;

/// Query filters for list operations. Absent and empty values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.iter().all(|(_, v)| v.is_empty())
    }

    pub fn apply(&self, url: &mut Url) {
        append_query(url, self.params.iter().map(|(k, v)| (k, v)));
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(QueryParams::new(), |params, (k, v)| params.add(k, v))
    }
}

/// Filters accepted by most list operations.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub name: Option<String>,
    pub type_: Option<String>,
    pub status: Option<String>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn to_query_params(&self) -> QueryParams {
        QueryParams::new()
            .add_optional("name", self.name.as_deref())
            .add_optional("type", self.type_.as_deref())
            .add_optional("status", self.status.as_deref())
    }
}

/// Body of a 201 response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatedObject {
    #[serde(rename = "object-uri", default)]
    pub object_uri: String,
}

/// Body of a 202 response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct JobHandle {
    #[serde(rename = "job-uri", default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_skip_missing_values() {
        let params = QueryParams::new()
            .add("name", "LPAR1")
            .add("max", 10)
            .add_optional("status", Some("active"))
            .add_optional("type", None::<String>);

        let mut url = Url::parse("https://hmc/api/cpcs/1/partitions").unwrap();
        params.apply(&mut url);

        let query = url.query().unwrap();
        assert!(query.contains("name=LPAR1"));
        assert!(query.contains("max=10"));
        assert!(query.contains("status=active"));
        assert!(!query.contains("type="));
    }

    #[test]
    fn empty_params_leave_url_alone() {
        let params = QueryParams::new().add("name", "");
        assert!(params.is_empty());

        let mut url = Url::parse("https://hmc/api/cpcs").unwrap();
        params.apply(&mut url);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn list_filter_maps_to_query() {
        let params = ListFilter::new()
            .with_name("sg-1")
            .with_type("fcp")
            .to_query_params();
        let expected: QueryParams = [("name", "sg-1"), ("type", "fcp")].into_iter().collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn job_handle_parses_accepted_body() {
        let handle: JobHandle =
            serde_json::from_str(r#"{"job-uri":"/api/jobs/7","message":""}"#).unwrap();
        assert_eq!(handle.uri, "/api/jobs/7");
        assert_eq!(handle.message.as_deref(), Some(""));
    }
}
