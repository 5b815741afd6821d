// ── SYS db variable ──
//
// Db variables differ from every other resource: they always exist on
// the device, so the states are `present` (converge to a value) and
// `reset` (converge back to the factory default). The device reports
// both `value` and `defaultValue` as strings.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::device::Device;
use crate::diff::{Changes, Outcome};
use crate::error::CoreError;

/// Target state for a db variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbState {
    #[default]
    Present,
    Reset,
}

/// A declared db variable value. Declarations may write numbers and
/// booleans without quoting; the device only speaks strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DbValue {
    Text(String),
    Number(i64),
    Bool(bool),
}

impl DbValue {
    fn as_wire(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Desired state for a sys db variable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SysDbSpec {
    /// Variable key, e.g. `setup.run` or `provision.cpu.afm`.
    pub key: String,
    pub value: Option<DbValue>,
    #[serde(default)]
    pub state: DbState,
}

#[derive(Debug, Serialize)]
struct DbPatch {
    value: String,
}

// ── Manager ─────────────────────────────────────────────────────────

/// Reconciles one sys db variable against the device.
pub struct SysDbManager<'a> {
    device: &'a Device,
    spec: &'a SysDbSpec,
}

impl<'a> SysDbManager<'a> {
    pub fn new(device: &'a Device, spec: &'a SysDbSpec) -> Self {
        Self { device, spec }
    }

    /// Drive the variable to its declared state.
    pub async fn ensure(&self, check: bool) -> Result<Outcome, CoreError> {
        match self.spec.state {
            DbState::Present => self.present(check).await,
            DbState::Reset => self.reset(check).await,
        }
    }

    async fn read(&self) -> Result<bigsync_api::rest::models::DbVariable, CoreError> {
        self.device
            .rest()
            .read_db_variable(&self.spec.key)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: "db variable".into(),
                name: self.spec.key.clone(),
            })
    }

    async fn present(&self, check: bool) -> Result<Outcome, CoreError> {
        let want = self
            .spec
            .value
            .as_ref()
            .map(DbValue::as_wire)
            .ok_or_else(|| {
                CoreError::validation("value", "When setting a key, a value must be supplied")
            })?;
        let current = self.read().await?;
        let have = current.value.unwrap_or_default();
        if have == want {
            return Ok(Outcome::unchanged());
        }

        let mut changes = Changes::new();
        changes.record("value", json!(have), json!(want));
        if check {
            return Ok(Outcome::updated(changes));
        }
        self.device
            .rest()
            .patch_db_variable(&self.spec.key, &DbPatch { value: want })
            .await?;
        Ok(Outcome::updated(changes))
    }

    async fn reset(&self, check: bool) -> Result<Outcome, CoreError> {
        let current = self.read().await?;
        let default_value = current.default_value.clone().ok_or_else(|| {
            CoreError::OperationFailed {
                message: format!("'{}' has no default value to reset to", self.spec.key),
            }
        })?;
        let have = current.value.unwrap_or_default();
        if have == default_value {
            return Ok(Outcome::unchanged());
        }

        let mut changes = Changes::new();
        changes.record("value", json!(have), json!(default_value.clone()));
        if check {
            return Ok(Outcome::updated(changes));
        }
        self.device
            .rest()
            .patch_db_variable(
                &self.spec.key,
                &DbPatch {
                    value: default_value,
                },
            )
            .await?;
        Ok(Outcome::updated(changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_value_renders_wire_strings() {
        assert_eq!(DbValue::Text("baud19200".into()).as_wire(), "baud19200");
        assert_eq!(DbValue::Number(300).as_wire(), "300");
        assert_eq!(DbValue::Bool(true).as_wire(), "true");
    }

    #[test]
    fn spec_parses_unquoted_values() {
        let spec: SysDbSpec = toml::from_str(
            r#"
            key = "setup.run"
            value = false
            "#,
        )
        .expect("valid spec");
        assert_eq!(
            spec.value.as_ref().map(DbValue::as_wire).as_deref(),
            Some("false")
        );
        assert_eq!(spec.state, DbState::Present);
    }

    #[test]
    fn spec_parses_reset_state() {
        let spec: SysDbSpec = toml::from_str(
            r#"
            key = "ui.setup"
            state = "reset"
            "#,
        )
        .expect("valid spec");
        assert_eq!(spec.state, DbState::Reset);
    }
}
