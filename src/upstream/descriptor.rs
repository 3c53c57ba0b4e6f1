//! Outbound call descriptor.

use reqwest::Method;
use std::collections::BTreeMap;
use url::Url;

/// Method, target and query of one outbound call.
///
/// Query parameters are kept as a map (unique keys) and encoded with the
/// form serializer when the target URL is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    method: Method,
    url: Url,
    query: BTreeMap<String, String>,
}

impl CallDescriptor {
    /// Describe a `GET` to `url`.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            query: BTreeMap::new(),
        }
    }

    /// Set a query parameter, replacing any earlier value for `key`.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Base URL with the encoded query appended.
    pub fn target(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }
}
