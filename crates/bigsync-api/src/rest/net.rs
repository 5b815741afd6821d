// NET endpoints: VLANs.
//
// VLAN reads expand the interfaces subcollection inline so a single GET
// returns the complete object.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::Vlan;
use crate::rest::transform_name;

impl RestClient {
    /// Check whether a VLAN exists.
    ///
    /// `GET /mgmt/tm/net/vlan/{~partition~name}`
    pub async fn vlan_exists(&self, partition: &str, name: &str) -> Result<bool, Error> {
        let url = self.tm_url(&format!("net/vlan/{}", transform_name(partition, name)));
        Ok(self.get_optional::<Value>(url).await?.is_some())
    }

    /// Read a VLAN's current configuration, interfaces included.
    ///
    /// `GET /mgmt/tm/net/vlan/{~partition~name}?expandSubcollections=true`
    pub async fn read_vlan(&self, partition: &str, name: &str) -> Result<Option<Vlan>, Error> {
        let mut url = self.tm_url(&format!("net/vlan/{}", transform_name(partition, name)));
        url.set_query(Some("expandSubcollections=true"));
        self.get_optional(url).await
    }

    /// Create a VLAN.
    pub async fn create_vlan(&self, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        let url = self.tm_url("net/vlan");
        debug!("creating vlan");
        let _: Value = self.post(url, body).await?;
        Ok(())
    }

    /// Patch a VLAN with the changed attributes only.
    pub async fn patch_vlan(
        &self,
        partition: &str,
        name: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url(&format!("net/vlan/{}", transform_name(partition, name)));
        debug!(name, "updating vlan");
        let _: Value = self.patch(url, body).await?;
        Ok(())
    }

    /// Delete a VLAN.
    pub async fn delete_vlan(&self, partition: &str, name: &str) -> Result<(), Error> {
        let url = self.tm_url(&format!("net/vlan/{}", transform_name(partition, name)));
        debug!(name, "deleting vlan");
        self.delete(url).await
    }
}
