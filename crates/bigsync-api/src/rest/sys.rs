// SYS endpoints: db variables.
//
// Db variable keys are global -- no partition qualification -- and the
// objects can only be read and patched, never created or deleted.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::DbVariable;

impl RestClient {
    /// Read a sys db variable.
    ///
    /// `GET /mgmt/tm/sys/db/{key}` -- returns `None` for unknown keys.
    pub async fn read_db_variable(&self, key: &str) -> Result<Option<DbVariable>, Error> {
        let url = self.tm_url(&format!("sys/db/{key}"));
        self.get_optional(url).await
    }

    /// Patch a sys db variable's value.
    ///
    /// `PATCH /mgmt/tm/sys/db/{key}` with `{"value": "..."}`
    pub async fn patch_db_variable(
        &self,
        key: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.tm_url(&format!("sys/db/{key}"));
        debug!(key, "updating db variable");
        let _: Value = self.patch(url, body).await?;
        Ok(())
    }
}
