//! Compartment lookups over HTTP.

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::trace;

use super::{build_client, decode, join_url, next_page_token, send};
use crate::compartments::{Compartment, CompartmentSource};
use crate::extract::FetchError;

pub const IDENTITY_API_VERSION: &str = "20160918";

/// `CompartmentSource` backed by the identity service.
#[derive(Debug, Clone)]
pub struct HttpCompartmentSource {
    client: Client,
    endpoint: String,
}

impl HttpCompartmentSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(FetchError::Unexpected(
                "identity endpoint must not be empty".to_string(),
            ));
        }
        Ok(Self::with_client(build_client(timeout)?, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn compartments_url(&self) -> String {
        join_url(
            &self.endpoint,
            &format!("{}/compartments", IDENTITY_API_VERSION),
        )
    }
}

impl CompartmentSource for HttpCompartmentSource {
    fn get_compartment(&self, id: &str) -> Result<Compartment, FetchError> {
        let url = format!("{}/{}", self.compartments_url(), id);
        trace!(%url, "fetching compartment");
        decode(send(self.client.get(url))?)
    }

    fn list_children(&self, parent_id: &str) -> Result<Vec<Compartment>, FetchError> {
        let mut children = Vec::new();
        let mut page: Option<String> = None;

        loop {
            let mut query = vec![
                ("compartmentId", parent_id.to_string()),
                ("accessLevel", "ANY".to_string()),
            ];
            if let Some(token) = &page {
                query.push(("page", token.clone()));
            }
            trace!(parent = parent_id, page = ?page, "listing compartments");

            let response = send(self.client.get(self.compartments_url()).query(&query))?;
            let next = next_page_token(response.headers());
            let mut batch: Vec<Compartment> = decode(response)?;
            children.append(&mut batch);

            match next {
                Some(token) if page.as_deref() == Some(token.as_str()) => {
                    return Err(FetchError::Unexpected(format!(
                        "repeated page token '{}' while listing {}",
                        token, parent_id
                    )));
                }
                Some(token) => page = Some(token),
                None => break,
            }
        }

        Ok(children)
    }
}
