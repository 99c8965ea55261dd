//! Response decoding shared by the resource APIs

use serde::de::DeserializeOwned;

use super::common::{CreatedObject, JobHandle};
use super::error::{ErrorKind, HmcError, Result};
use super::request::Response;

pub struct ResponseHandler;

impl ResponseHandler {
    /// Decode the body of a response whose status is one of `ok`.
    pub fn json<T: DeserializeOwned>(response: Response, ok: &[u16]) -> Result<T> {
        if !accepts(ok, response.status) {
            return Err(Self::unexpected(&response));
        }

        if response.body.is_empty() {
            return Err(HmcError::new(
                ErrorKind::EmptyResponse,
                "response body is empty",
            )
            .with_status(response.status));
        }

        serde_json::from_slice::<T>(&response.body).map_err(|e| {
            tracing::error!(
                "Failed to parse response: {}, body: {}",
                e,
                String::from_utf8_lossy(&response.body)
            );
            HmcError::unmarshal(e).with_status(response.status)
        })
    }

    /// Decode `{<collection>: [T]}`. A missing collection is an empty list.
    pub fn list<T: DeserializeOwned>(response: Response, collection: &str) -> Result<Vec<T>> {
        let status = response.status;
        let mut document: serde_json::Map<String, serde_json::Value> =
            Self::json(response, &[200])?;

        match document.remove(collection) {
            Some(items) => serde_json::from_value(items)
                .map_err(|e| HmcError::unmarshal(e).with_status(status)),
            None => Ok(Vec::new()),
        }
    }

    /// Succeed when the status is one of `ok`; the body is ignored.
    pub fn empty(response: Response, ok: &[u16]) -> Result<()> {
        if accepts(ok, response.status) {
            Ok(())
        } else {
            Err(Self::unexpected(&response))
        }
    }

    /// URI of the object created by a 201 response.
    pub fn created_uri(response: Response) -> Result<String> {
        let status = response.status;
        let created: CreatedObject = Self::json(response, &[201])?;
        if created.object_uri.is_empty() {
            return Err(HmcError::new(
                ErrorKind::EmptyResponse,
                "created object has no object-uri",
            )
            .with_status(status));
        }
        Ok(created.object_uri)
    }

    /// Job started by a 202 response.
    pub fn job(response: Response) -> Result<JobHandle> {
        let status = response.status;
        let handle: JobHandle = Self::json(response, &[202])?;
        if handle.uri.is_empty() {
            return Err(
                HmcError::new(ErrorKind::EmptyJobUri, "accepted response carries no job URI")
                    .with_status(status),
            );
        }
        Ok(handle)
    }

    /// `None` for a synchronous success (200/204), the job for a 202.
    pub fn maybe_job(response: Response) -> Result<Option<JobHandle>> {
        match response.status {
            200 | 204 => Ok(None),
            _ => Self::job(response).map(Some),
        }
    }

    /// Error for a status the operation does not accept: the console's
    /// error document for 4xx/5xx, a bad-request error for anything else.
    pub fn unexpected(response: &Response) -> HmcError {
        if response.status >= 400 {
            response.server_error()
        } else {
            HmcError::new(
                ErrorKind::BadRequest,
                format!("unexpected HTTP status {}", response.status),
            )
            .with_status(response.status)
        }
    }
}

/// 206 counts wherever 200 does.
fn accepts(ok: &[u16], status: u16) -> bool {
    ok.contains(&status) || (status == 206 && ok.contains(&200))
}
