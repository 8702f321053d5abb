//! Command pattern implementation for undo/redo and synchronization.
//!
//! Every edit of the shared map, local or replayed from the server, goes
//! through a command so that it can be serialized, undone and rolled back.

mod area_commands;
mod command;
mod entity_commands;
mod floor_commands;
mod settings_commands;

pub use area_commands::{CreateAreaCommand, DeleteAreaCommand, UpdateAreaCommand};
pub use command::{Command, CommandError, CommandId, CommandKind, CommandResult};
pub use entity_commands::{CreateEntityCommand, DeleteEntityCommand, UpdateEntityCommand};
pub use floor_commands::ModifyFloorCommand;
pub use settings_commands::UpdateWamSettingCommand;
