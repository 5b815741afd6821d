// LTM endpoints: HTTP, TCP, and server-ssl profiles.
//
// Object URLs embed the partition-qualified name (`~Common~foo`); create
// posts to the collection, update patches the object directly.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{HttpProfile, ServerSslProfile, TcpProfile};
use crate::rest::transform_name;

impl RestClient {
    // ── HTTP profile ─────────────────────────────────────────────────

    /// Check whether an HTTP profile exists.
    ///
    /// `GET /mgmt/tm/ltm/profile/http/{~partition~name}`
    pub async fn http_profile_exists(&self, partition: &str, name: &str) -> Result<bool, Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/http/{}",
            transform_name(partition, name)
        ));
        Ok(self.get_optional::<Value>(url).await?.is_some())
    }

    /// Read an HTTP profile's current configuration.
    pub async fn read_http_profile(
        &self,
        partition: &str,
        name: &str,
    ) -> Result<Option<HttpProfile>, Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/http/{}",
            transform_name(partition, name)
        ));
        self.get_optional(url).await
    }

    /// Create an HTTP profile.
    ///
    /// `POST /mgmt/tm/ltm/profile/http` -- the body must include `name`
    /// and `partition`.
    pub async fn create_http_profile(&self, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        let url = self.tm_url("ltm/profile/http");
        debug!("creating http profile");
        let _: Value = self.post(url, body).await?;
        Ok(())
    }

    /// Patch an HTTP profile with the changed attributes only.
    pub async fn patch_http_profile(
        &self,
        partition: &str,
        name: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/http/{}",
            transform_name(partition, name)
        ));
        debug!(name, "updating http profile");
        let _: Value = self.patch(url, body).await?;
        Ok(())
    }

    /// Delete an HTTP profile.
    pub async fn delete_http_profile(&self, partition: &str, name: &str) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/http/{}",
            transform_name(partition, name)
        ));
        debug!(name, "deleting http profile");
        self.delete(url).await
    }

    // ── TCP profile ──────────────────────────────────────────────────

    /// Check whether a TCP profile exists.
    pub async fn tcp_profile_exists(&self, partition: &str, name: &str) -> Result<bool, Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/tcp/{}",
            transform_name(partition, name)
        ));
        Ok(self.get_optional::<Value>(url).await?.is_some())
    }

    /// Read a TCP profile's current configuration.
    pub async fn read_tcp_profile(
        &self,
        partition: &str,
        name: &str,
    ) -> Result<Option<TcpProfile>, Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/tcp/{}",
            transform_name(partition, name)
        ));
        self.get_optional(url).await
    }

    /// Create a TCP profile.
    pub async fn create_tcp_profile(&self, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        let url = self.tm_url("ltm/profile/tcp");
        debug!("creating tcp profile");
        let _: Value = self.post(url, body).await?;
        Ok(())
    }

    /// Patch a TCP profile with the changed attributes only.
    pub async fn patch_tcp_profile(
        &self,
        partition: &str,
        name: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/tcp/{}",
            transform_name(partition, name)
        ));
        debug!(name, "updating tcp profile");
        let _: Value = self.patch(url, body).await?;
        Ok(())
    }

    /// Delete a TCP profile.
    pub async fn delete_tcp_profile(&self, partition: &str, name: &str) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/tcp/{}",
            transform_name(partition, name)
        ));
        debug!(name, "deleting tcp profile");
        self.delete(url).await
    }

    // ── Server-SSL profile ───────────────────────────────────────────

    /// Check whether a server-ssl profile exists.
    pub async fn server_ssl_profile_exists(
        &self,
        partition: &str,
        name: &str,
    ) -> Result<bool, Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/server-ssl/{}",
            transform_name(partition, name)
        ));
        Ok(self.get_optional::<Value>(url).await?.is_some())
    }

    /// Read a server-ssl profile's current configuration.
    pub async fn read_server_ssl_profile(
        &self,
        partition: &str,
        name: &str,
    ) -> Result<Option<ServerSslProfile>, Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/server-ssl/{}",
            transform_name(partition, name)
        ));
        self.get_optional(url).await
    }

    /// Create a server-ssl profile.
    pub async fn create_server_ssl_profile(
        &self,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url("ltm/profile/server-ssl");
        debug!("creating server-ssl profile");
        let _: Value = self.post(url, body).await?;
        Ok(())
    }

    /// Patch a server-ssl profile with the changed attributes only.
    pub async fn patch_server_ssl_profile(
        &self,
        partition: &str,
        name: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/server-ssl/{}",
            transform_name(partition, name)
        ));
        debug!(name, "updating server-ssl profile");
        let _: Value = self.patch(url, body).await?;
        Ok(())
    }

    /// Delete a server-ssl profile.
    pub async fn delete_server_ssl_profile(&self, partition: &str, name: &str) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "ltm/profile/server-ssl/{}",
            transform_name(partition, name)
        ));
        debug!(name, "deleting server-ssl profile");
        self.delete(url).await
    }
}
