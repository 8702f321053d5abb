//! Void Map Editor headless client
//!
//! Joins a room's map server and drives the editor from stdin, one key
//! binding per line (`2`, `ctrl+z`, `ctrl+shift+z`, ...). `quit` exits.
//!
//! Run with: cargo run -p void_map_editor -- [path/to/config.toml]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, BufReader};
use void_map::GameMap;
use void_map_editor::{KeyEvent, MapEditor, MapEditorConfig, RoomConnection};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(MapEditorConfig::default_path);
    let config = match &config_path {
        Some(path) if path.exists() => MapEditorConfig::load(path)?,
        _ => MapEditorConfig::default(),
    };

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();
    log::info!("Void Map Editor v{}", void_map_editor::VERSION);

    let editor = MapEditor::new(config.clone(), GameMap::shared());

    let connection = match &config.server_url {
        Some(url) => {
            let connection = Arc::new(RoomConnection::connect(url).await?);
            editor.subscribe_to_room_connection(&connection)?;
            Some(connection)
        }
        None => {
            log::warn!("No server_url configured, edits stay local");
            None
        }
    };

    editor.set_visible(true);
    editor.set_mode_active(true);
    log::info!("Map editor ready, tool: {:?}", editor.active_tool());

    let started = Instant::now();
    let mut last_frame = started;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        let Some(event) = KeyEvent::parse(line) else {
            log::warn!("Unrecognized key binding '{}'", line);
            continue;
        };
        if let Some(job) = editor.handle_key_down(&event) {
            job.await?;
        }

        let now = Instant::now();
        editor.update(
            now.duration_since(started).as_secs_f64(),
            now.duration_since(last_frame).as_secs_f64(),
        );
        last_frame = now;

        let executor = editor.executor();
        log::info!(
            "tool: {:?}, history: {} (cursor {}), pending: {}",
            editor.active_tool(),
            executor.history_len(),
            executor.current_index(),
            executor.pending_len()
        );
    }

    editor.destroy();
    if let Some(connection) = connection {
        connection.close();
    }
    Ok(())
}
