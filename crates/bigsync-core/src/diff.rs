// ── Reconciliation outcome types ──
//
// Every manager reports its work as an `Outcome`: whether anything
// changed, which action ran, and a per-field change list with both the
// device's old value and the applied new value in user-facing form.

use serde::Serialize;
use serde_json::Value;

/// The action a reconciliation performed (or would perform, in check mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    None,
}

/// One changed field, rendered in user-facing form.
///
/// `old` is `Null` when the object is being created.
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: Value,
    pub new: Value,
}

/// Ordered collection of field changes.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Changes(Vec<FieldChange>);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change. `Null` new values are skipped -- an unset desired
    /// field is not a change.
    pub fn record(&mut self, field: &'static str, old: Value, new: Value) {
        if new.is_null() {
            return;
        }
        self.0.push(FieldChange { field, old, new });
    }

    /// Record a change where the new value may legitimately be an empty
    /// list or other falsy value (attribute clears).
    pub fn record_cleared(&mut self, field: &'static str, old: Value, new: Value) {
        self.0.push(FieldChange { field, old, new });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldChange> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Changes {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Normalized result of one reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub action: Action,
    pub changes: Changes,
}

impl Outcome {
    /// Nothing to do -- desired and current state already match.
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            action: Action::None,
            changes: Changes::new(),
        }
    }

    pub fn created(changes: Changes) -> Self {
        Self {
            changed: true,
            action: Action::Create,
            changes,
        }
    }

    pub fn updated(changes: Changes) -> Self {
        Self {
            changed: true,
            action: Action::Update,
            changes,
        }
    }

    pub fn deleted() -> Self {
        Self {
            changed: true,
            action: Action::Delete,
            changes: Changes::new(),
        }
    }
}
