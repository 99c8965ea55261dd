//! Console endpoint and request URL construction

use url::Url;

use super::error::{ErrorKind, HmcError, Result};

/// Validated base URL of the console, e.g. `https://hmc.example.com:6794/api`.
///
/// Request URLs are always built from a clone so the endpoint itself is never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Parse and validate an endpoint. Only `https` is accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| {
            HmcError::new(
                ErrorKind::InvalidUrl,
                format!("cannot parse endpoint {:?}: {}", raw, e),
            )
        })?;

        if url.scheme() != "https" {
            return Err(HmcError::new(
                ErrorKind::InvalidUrl,
                format!("endpoint scheme must be https, got {:?}", url.scheme()),
            ));
        }

        Self::from_url(url)
    }

    /// Validate everything but the scheme. Used for plain-HTTP test servers.
    pub(crate) fn from_url(mut url: Url) -> Result<Self> {
        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => {
                return Err(HmcError::new(
                    ErrorKind::InvalidUrl,
                    format!("endpoint {:?} has no host", url.as_str()),
                ))
            }
        }

        if url.cannot_be_a_base() {
            return Err(HmcError::new(
                ErrorKind::InvalidUrl,
                format!("endpoint {:?} cannot carry a path", url.as_str()),
            ));
        }

        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self { url })
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Path prefix without a trailing slash; empty when the endpoint is the host root.
    pub fn base_path(&self) -> &str {
        self.url.path().trim_end_matches('/')
    }

    /// Deep copy of the endpoint URL, free to mutate.
    pub fn clone_url(&self) -> Url {
        self.url.clone()
    }

    /// URL for a resource path or a console-issued URI.
    ///
    /// URIs returned by the console already carry the prefix
    /// (`/api/partitions/1`) and replace the path; anything else is appended
    /// to the prefix.
    pub fn resource_url(&self, uri: &str) -> Url {
        let base = self.base_path();
        let prefixed = !base.is_empty()
            && (uri == base || uri.starts_with(&format!("{}/", base)));

        let path = if prefixed {
            uri.to_string()
        } else {
            format!("{}/{}", base, uri.trim_start_matches('/'))
        };

        let mut url = self.clone_url();
        url.set_path(&path);
        url
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Append name/value pairs to the query of `url`. Pairs with an empty value
/// are skipped, and nothing is touched when no pair remains.
pub fn append_query<I, K, V>(url: &mut Url, params: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs = params
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .peekable();

    if pairs.peek().is_none() {
        return;
    }

    let mut query = url.query_pairs_mut();
    for (name, value) in pairs {
        query.append_pair(name.as_ref(), value.as_ref());
    }
}
