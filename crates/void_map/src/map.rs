//! The map itself and its change notifications.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::{AreaData, AreaId, EntityData, EntityId, FloorTile, MapError, MapResult, TileCoord};

/// Room-wide settings, keyed by setting name.
pub type WamSettings = BTreeMap<String, serde_json::Value>;

/// Map shared between the editor core, its tools and the host.
pub type SharedMap = Arc<RwLock<GameMap>>;

/// Capacity of the change broadcast before slow subscribers lag.
const EVENT_CAPACITY: usize = 256;

/// Notification published after each successful mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    AreaAdded(AreaId),
    AreaUpdated(AreaId),
    AreaDeleted(AreaId),
    EntityAdded(EntityId),
    EntityUpdated(EntityId),
    EntityDeleted(EntityId),
    /// Number of cells changed
    FloorChanged(usize),
    SettingChanged(String),
}

/// In-memory map state.
pub struct GameMap {
    areas: BTreeMap<AreaId, AreaData>,
    entities: BTreeMap<EntityId, EntityData>,
    floor: BTreeMap<TileCoord, String>,
    settings: WamSettings,
    /// Id of the last command applied to this map
    last_command_id: Option<String>,
    events: broadcast::Sender<MapEvent>,
}

impl Default for GameMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameMap")
            .field("areas", &self.areas.len())
            .field("entities", &self.entities.len())
            .field("floor", &self.floor.len())
            .field("settings", &self.settings.len())
            .field("last_command_id", &self.last_command_id)
            .finish()
    }
}

impl GameMap {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            areas: BTreeMap::new(),
            entities: BTreeMap::new(),
            floor: BTreeMap::new(),
            settings: WamSettings::new(),
            last_command_id: None,
            events,
        }
    }

    /// Create an empty map behind a shared lock.
    pub fn shared() -> SharedMap {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: MapEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // Areas

    pub fn area(&self, id: &AreaId) -> Option<&AreaData> {
        self.areas.get(id)
    }

    pub fn areas(&self) -> impl Iterator<Item = &AreaData> {
        self.areas.values()
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn add_area(&mut self, area: AreaData) -> MapResult<()> {
        if self.areas.contains_key(&area.id) {
            return Err(MapError::AreaExists(area.id));
        }
        let id = area.id.clone();
        self.areas.insert(id.clone(), area);
        self.publish(MapEvent::AreaAdded(id));
        Ok(())
    }

    /// Replace an existing area, returning the previous data.
    pub fn update_area(&mut self, area: AreaData) -> MapResult<AreaData> {
        let slot = self
            .areas
            .get_mut(&area.id)
            .ok_or_else(|| MapError::AreaNotFound(area.id.clone()))?;
        let id = area.id.clone();
        let previous = std::mem::replace(slot, area);
        self.publish(MapEvent::AreaUpdated(id));
        Ok(previous)
    }

    pub fn delete_area(&mut self, id: &AreaId) -> MapResult<AreaData> {
        let removed = self
            .areas
            .remove(id)
            .ok_or_else(|| MapError::AreaNotFound(id.clone()))?;
        self.publish(MapEvent::AreaDeleted(id.clone()));
        Ok(removed)
    }

    /// Topmost area containing the point.
    pub fn area_at(&self, x: f32, y: f32) -> Option<&AreaData> {
        self.areas.values().rev().find(|a| a.contains(x, y))
    }

    // Entities

    pub fn entity(&self, id: &EntityId) -> Option<&EntityData> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityData> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn add_entity(&mut self, entity: EntityData) -> MapResult<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(MapError::EntityExists(entity.id));
        }
        let id = entity.id.clone();
        self.entities.insert(id.clone(), entity);
        self.publish(MapEvent::EntityAdded(id));
        Ok(())
    }

    pub fn update_entity(&mut self, entity: EntityData) -> MapResult<EntityData> {
        let slot = self
            .entities
            .get_mut(&entity.id)
            .ok_or_else(|| MapError::EntityNotFound(entity.id.clone()))?;
        let id = entity.id.clone();
        let previous = std::mem::replace(slot, entity);
        self.publish(MapEvent::EntityUpdated(id));
        Ok(previous)
    }

    pub fn delete_entity(&mut self, id: &EntityId) -> MapResult<EntityData> {
        let removed = self
            .entities
            .remove(id)
            .ok_or_else(|| MapError::EntityNotFound(id.clone()))?;
        self.publish(MapEvent::EntityDeleted(id.clone()));
        Ok(removed)
    }

    // Floor

    pub fn tile(&self, coord: TileCoord) -> Option<&str> {
        self.floor.get(&coord).map(|s| s.as_str())
    }

    pub fn tile_count(&self) -> usize {
        self.floor.len()
    }

    /// Current contents of the given cells, in the same order.
    pub fn snapshot_tiles(&self, tiles: &[FloorTile]) -> Vec<FloorTile> {
        tiles
            .iter()
            .map(|t| FloorTile {
                x: t.x,
                y: t.y,
                tile: self.floor.get(&t.coord()).cloned(),
            })
            .collect()
    }

    /// Apply tile assignments, returning what the cells held before.
    pub fn set_tiles(&mut self, tiles: &[FloorTile]) -> Vec<FloorTile> {
        let previous = self.snapshot_tiles(tiles);
        for t in tiles {
            match &t.tile {
                Some(tile) => {
                    self.floor.insert(t.coord(), tile.clone());
                }
                None => {
                    self.floor.remove(&t.coord());
                }
            }
        }
        self.publish(MapEvent::FloorChanged(tiles.len()));
        previous
    }

    // Settings

    pub fn setting(&self, name: &str) -> Option<&serde_json::Value> {
        self.settings.get(name)
    }

    pub fn settings(&self) -> &WamSettings {
        &self.settings
    }

    /// Set (`Some`) or remove (`None`) a setting, returning the old value.
    pub fn update_setting(
        &mut self,
        name: &str,
        value: Option<serde_json::Value>,
    ) -> Option<serde_json::Value> {
        let previous = match value {
            Some(value) => self.settings.insert(name.to_string(), value),
            None => self.settings.remove(name),
        };
        self.publish(MapEvent::SettingChanged(name.to_string()));
        previous
    }

    // Bookkeeping

    pub fn last_command_id(&self) -> Option<&str> {
        self.last_command_id.as_deref()
    }

    pub fn update_last_command_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        log::trace!("Map now at command {}", id);
        self.last_command_id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_lifecycle() {
        let mut map = GameMap::new();
        let area = AreaData::new("a1", "Lobby", 0.0, 0.0, 10.0, 10.0);

        map.add_area(area.clone()).unwrap();
        assert_eq!(map.add_area(area.clone()), Err(MapError::AreaExists(area.id.clone())));

        let mut renamed = area.clone();
        renamed.name = "Hall".to_string();
        let previous = map.update_area(renamed).unwrap();
        assert_eq!(previous.name, "Lobby");
        assert_eq!(map.area(&area.id).unwrap().name, "Hall");

        map.delete_area(&area.id).unwrap();
        assert_eq!(map.area_count(), 0);
        assert!(map.delete_area(&area.id).is_err());
    }

    #[test]
    fn test_set_tiles_returns_previous() {
        let mut map = GameMap::new();
        map.set_tiles(&[FloorTile::paint(0, 0, "grass")]);

        let previous = map.set_tiles(&[FloorTile::paint(0, 0, "wood"), FloorTile::paint(1, 0, "wood")]);
        assert_eq!(previous, vec![FloorTile::paint(0, 0, "grass"), FloorTile::erase(1, 0)]);
        assert_eq!(map.tile(TileCoord::new(1, 0)), Some("wood"));

        map.set_tiles(&previous);
        assert_eq!(map.tile(TileCoord::new(0, 0)), Some("grass"));
        assert_eq!(map.tile(TileCoord::new(1, 0)), None);
    }

    #[test]
    fn test_mutations_are_published() {
        let mut map = GameMap::new();
        let mut events = map.subscribe();

        map.add_entity(EntityData::new("e1", "chair", 1.0, 2.0)).unwrap();
        map.update_setting("megaphone", Some(serde_json::json!({ "enabled": true })));

        assert_eq!(events.try_recv().unwrap(), MapEvent::EntityAdded(EntityId::new("e1")));
        assert_eq!(events.try_recv().unwrap(), MapEvent::SettingChanged("megaphone".to_string()));
    }

    #[test]
    fn test_update_setting_remove() {
        let mut map = GameMap::new();
        assert_eq!(map.update_setting("lights", Some(serde_json::json!(1))), None);
        assert_eq!(map.update_setting("lights", None), Some(serde_json::json!(1)));
        assert!(map.setting("lights").is_none());
    }
}
