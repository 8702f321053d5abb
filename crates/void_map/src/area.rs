//! Map areas and their typed properties.

use serde::{Deserialize, Serialize};

/// Identifier of an area, assigned by whoever creates it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub String);

impl AreaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behaviour attached to an area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AreaProperty {
    /// Area that a single user may claim as their own.
    #[serde(rename = "personalAreaPropertyData", rename_all = "camelCase")]
    PersonalArea { owner_id: Option<String> },

    /// Users inside the area cannot be reached by others.
    Silent,

    /// Camera focuses on the area when entered.
    #[serde(rename_all = "camelCase")]
    Focusable { zoom_margin: f32 },

    /// A website is opened when entering the area.
    OpenWebsite { link: String },
}

/// A rectangular region of the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaData {
    pub id: AreaId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
    #[serde(default)]
    pub properties: Vec<AreaProperty>,
}

impl AreaData {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id: AreaId::new(id),
            name: name.into(),
            x,
            y,
            width,
            height,
            visible: true,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: AreaProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// The personal area property, if this area has one.
    pub fn personal_area(&self) -> Option<&AreaProperty> {
        self.properties
            .iter()
            .find(|p| matches!(p, AreaProperty::PersonalArea { .. }))
    }

    /// Owner of the personal area property, if claimed.
    pub fn owner(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match p {
            AreaProperty::PersonalArea { owner_id } => owner_id.as_deref(),
            _ => None,
        })
    }

    /// Set the owner on the personal area property.
    ///
    /// Returns `false` when the area has no such property.
    pub fn set_owner(&mut self, owner: impl Into<String>) -> bool {
        for property in &mut self.properties {
            if let AreaProperty::PersonalArea { owner_id } = property {
                *owner_id = Some(owner.into());
                return true;
            }
        }
        false
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}
