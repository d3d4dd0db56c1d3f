//! Registry operations module.
//!
//! [`RegistryApi`] is the seam between the cleaning core and a concrete
//! registry: the collector only lists, the cleaner only deletes. [`Registry`]
//! implements it over HTTP by pairing a [`Client`] with the credentials used
//! for every call.

use crate::auth::Credentials;
use crate::client::{Client, ClientConfig};
use crate::error::Result;
use crate::manifest::Listing;
use crate::reference::{Reference, Repository};
use async_trait::async_trait;


#[cfg(test)]
pub(crate) mod testing;

/// The registry operations the collector and cleaner depend on.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Lists the manifests and child repository names of `repository`.
    async fn list_manifests(&self, repository: &Repository) -> Result<Listing>;

    /// Deletes a tag or digest reference.
    async fn delete_reference(&self, reference: &Reference) -> Result<()>;
}

/// HTTP registry access with fixed credentials.
///
/// # Examples
///
/// ```
/// use libsweep::auth::Credentials;
/// use libsweep::client::Client;
/// use libsweep::registry::Registry;
///
/// let client = Client::new().unwrap();
/// let registry = Registry::new(client, Credentials::anonymous());
/// assert_eq!(registry.credentials(), &Credentials::Anonymous);
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    client: Client,
    credentials: Credentials,
}

impl Registry {
    /// Creates a registry from an existing client.
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Creates a registry with a freshly built client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_config(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        Ok(Self::new(Client::with_config(config)?, credentials))
    }

    /// Returns the underlying HTTP client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the credentials sent with each request.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl RegistryApi for Registry {
    async fn list_manifests(&self, repository: &Repository) -> Result<Listing> {
        self.client
            .list_manifests(repository, &self.credentials)
            .await
    }

    async fn delete_reference(&self, reference: &Reference) -> Result<()> {
        self.client
            .delete_reference(reference, &self.credentials)
            .await
    }
}
