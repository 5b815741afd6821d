// GTM endpoints: bigip monitors.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::GtmBigipMonitor;
use crate::rest::transform_name;

impl RestClient {
    /// Check whether a GTM bigip monitor exists.
    ///
    /// `GET /mgmt/tm/gtm/monitor/bigip/{~partition~name}`
    pub async fn gtm_bigip_monitor_exists(
        &self,
        partition: &str,
        name: &str,
    ) -> Result<bool, Error> {
        let url = self.tm_url(&format!(
            "gtm/monitor/bigip/{}",
            transform_name(partition, name)
        ));
        Ok(self.get_optional::<Value>(url).await?.is_some())
    }

    /// Read a GTM bigip monitor's current configuration.
    pub async fn read_gtm_bigip_monitor(
        &self,
        partition: &str,
        name: &str,
    ) -> Result<Option<GtmBigipMonitor>, Error> {
        let url = self.tm_url(&format!(
            "gtm/monitor/bigip/{}",
            transform_name(partition, name)
        ));
        self.get_optional(url).await
    }

    /// Create a GTM bigip monitor.
    pub async fn create_gtm_bigip_monitor(
        &self,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url("gtm/monitor/bigip");
        debug!("creating gtm bigip monitor");
        let _: Value = self.post(url, body).await?;
        Ok(())
    }

    /// Patch a GTM bigip monitor with the changed attributes only.
    pub async fn patch_gtm_bigip_monitor(
        &self,
        partition: &str,
        name: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "gtm/monitor/bigip/{}",
            transform_name(partition, name)
        ));
        debug!(name, "updating gtm bigip monitor");
        let _: Value = self.patch(url, body).await?;
        Ok(())
    }

    /// Delete a GTM bigip monitor.
    pub async fn delete_gtm_bigip_monitor(&self, partition: &str, name: &str) -> Result<(), Error> {
        let url = self.tm_url(&format!(
            "gtm/monitor/bigip/{}",
            transform_name(partition, name)
        ));
        debug!(name, "deleting gtm bigip monitor");
        self.delete(url).await
    }
}
