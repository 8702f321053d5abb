//! Entities placed on the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a placed entity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entity instance: a prefab placed at a position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    pub id: EntityId,
    /// Collection/prefab reference the entity was created from
    pub prefab_ref: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl EntityData {
    pub fn new(id: impl Into<String>, prefab_ref: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: EntityId::new(id),
            prefab_ref: prefab_ref.into(),
            x,
            y,
            name: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}
