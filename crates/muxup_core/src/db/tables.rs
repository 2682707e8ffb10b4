//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Canonical asset rows (`MuxAsset`, bincode-encoded), keyed by id.
pub const ASSETS: TableDefinition<u64, &[u8]> = TableDefinition::new("mux_assets");
/// Monotonic counters (currently only the next asset id).
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");
/// Plugin settings rows (`MuxSettings`, bincode-encoded).
pub const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// Counter key holding the last assigned asset id.
pub const LAST_ASSET_ID_KEY: &str = "last_asset_id";
/// Settings key for Mux credentials.
pub const MUX_SETTINGS_KEY: &str = "mux";
