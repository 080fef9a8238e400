//! In-memory stand-in for the hosted database behind the admin screens.
//!
//! Every mutation returns a [`RowChange`] holding the row before and after,
//! which is the payload recorded in the history. The store is also the
//! [`ActionHandler`] that puts those images back on undo and redo.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AgriportalError, Result};
use crate::history::{Action, ActionHandler, ActionKind, NewAction};

type Table = BTreeMap<String, Value>;

/// Before/after images of one row. `None` means the row did not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub id: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl RowChange {
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "before": self.before,
            "after": self.after,
        })
    }

    pub fn from_payload(payload: &Value) -> Result<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|e| AgriportalError::InvalidPayload(e.to_string()))
    }

    /// Build the history entry describing this change.
    pub fn to_new_action(
        &self,
        kind: ActionKind,
        resource: impl Into<String>,
        label: impl Into<String>,
    ) -> NewAction {
        NewAction::new(kind, resource, self.to_payload(), label)
    }
}

/// Named collections of JSON rows keyed by their `"id"` field.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `{ "<resource>": [rows...] }`.
    pub async fn from_seed(seed: Value) -> Result<Self> {
        let Value::Object(resources) = seed else {
            return Err(AgriportalError::Validation(
                "seed must be an object of resource arrays".to_string(),
            ));
        };
        let store = Self::new();
        for (resource, rows) in resources {
            let Value::Array(rows) = rows else {
                return Err(AgriportalError::Validation(format!(
                    "seed for '{resource}' must be an array"
                )));
            };
            for row in rows {
                store.create(&resource, row).await?;
            }
        }
        Ok(store)
    }

    /// Insert a new row. A missing `"id"` is generated.
    pub async fn create(&self, resource: &str, row: Value) -> Result<RowChange> {
        let mut fields = into_object(row)?;
        let id = match row_id(&fields)? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                fields.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let mut tables = self.tables.write().await;
        let table = tables.entry(resource.to_string()).or_default();
        if table.contains_key(&id) {
            return Err(AgriportalError::row_exists(resource, id));
        }
        let row = Value::Object(fields);
        table.insert(id.clone(), row.clone());
        debug!(resource, id = %id, "row created");

        Ok(RowChange {
            id,
            before: None,
            after: Some(row),
        })
    }

    /// Shallow-merge `patch` into an existing row.
    pub async fn update(&self, resource: &str, id: &str, patch: Value) -> Result<RowChange> {
        let patch = into_object(patch)?;
        if let Some(patch_id) = row_id(&patch)?
            && patch_id != id
        {
            return Err(AgriportalError::Validation(format!(
                "cannot change row id from '{id}' to '{patch_id}'"
            )));
        }

        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(resource)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| AgriportalError::not_found(resource, id))?;

        let before = row.clone();
        if let Value::Object(fields) = &mut *row {
            fields.extend(patch);
        }
        debug!(resource, id, "row updated");

        Ok(RowChange {
            id: id.to_string(),
            before: Some(before),
            after: Some(row.clone()),
        })
    }

    pub async fn delete(&self, resource: &str, id: &str) -> Result<RowChange> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .get_mut(resource)
            .and_then(|t| t.remove(id))
            .ok_or_else(|| AgriportalError::not_found(resource, id))?;
        debug!(resource, id, "row deleted");

        Ok(RowChange {
            id: id.to_string(),
            before: Some(removed),
            after: None,
        })
    }

    /// Put back a previously deleted row. The row must carry its `"id"`.
    pub async fn restore(&self, resource: &str, row: Value) -> Result<RowChange> {
        let fields = into_object(row)?;
        if row_id(&fields)?.is_none() {
            return Err(AgriportalError::Validation(
                "restored row must have an id".to_string(),
            ));
        }
        self.create(resource, Value::Object(fields)).await
    }

    pub async fn get(&self, resource: &str, id: &str) -> Option<Value> {
        let tables = self.tables.read().await;
        tables.get(resource).and_then(|t| t.get(id)).cloned()
    }

    /// Rows of one resource, ordered by id.
    pub async fn list(&self, resource: &str) -> Vec<Value> {
        let tables = self.tables.read().await;
        tables
            .get(resource)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn snapshot(&self) -> BTreeMap<String, Vec<Value>> {
        let tables = self.tables.read().await;
        tables
            .iter()
            .map(|(name, table)| (name.clone(), table.values().cloned().collect()))
            .collect()
    }

    /// Overwrite a row with `image`, or remove it when `image` is `None`.
    async fn apply(&self, resource: &str, id: &str, image: Option<Value>) -> Result<()> {
        let mut tables = self.tables.write().await;
        match image {
            Some(row) => {
                tables
                    .entry(resource.to_string())
                    .or_default()
                    .insert(id.to_string(), row);
            }
            None => {
                tables
                    .get_mut(resource)
                    .and_then(|t| t.remove(id))
                    .ok_or_else(|| AgriportalError::not_found(resource, id))?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ActionHandler for MemoryStore {
    async fn on_undo(&self, action: &Action) -> Result<()> {
        let change = RowChange::from_payload(&action.payload)?;
        self.apply(&action.resource, &change.id, change.before).await
    }

    async fn on_redo(&self, action: &Action) -> Result<()> {
        let change = RowChange::from_payload(&action.payload)?;
        self.apply(&action.resource, &change.id, change.after).await
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(AgriportalError::Validation(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn row_id(fields: &Map<String, Value>) -> Result<Option<String>> {
    match fields.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if !id.is_empty() => Ok(Some(id.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(AgriportalError::Validation(format!(
            "row id must be a non-empty string or number, got {other}"
        ))),
    }
}
