//! Project layout, configuration, and the SQLite snapshot history.
//!
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `ProjectConfig`: serializable project metadata.
//! - `HistoryDb`: a small SQLite wrapper holding undo/redo checkpoints.
//! - `ProjectContext`: layout + config + history bundled for one project root.

mod config;
mod context;
mod history;
mod layout;
mod util;

pub use config::{DesignConfig, HistoryConfig, ProjectConfig};
pub use context::ProjectContext;
pub use history::{
    current_schema_version, sha256_hex, Checkpoint, DbError, DbResult, HistoryDb,
    CURRENT_SCHEMA_VERSION,
};
pub use layout::ProjectLayout;
pub use util::{load_project_config, open_history_db, save_project_config};
