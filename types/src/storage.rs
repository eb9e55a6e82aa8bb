//! Local file storage (OPFS) naming and cache bookkeeping types

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// URI scheme DuckDB-WASM uses for OPFS-backed databases
pub const OPFS_SCHEME: &str = "opfs://";

/// Suffix of the write-ahead log sitting next to a database file
pub const WAL_SUFFIX: &str = ".wal";

/// Where a cached blob came from on the last load
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum CacheSource {
    /// Served from the OPFS entry
    Cache,
    /// Fetched and written back to OPFS
    Network,
    /// Fetched, but the write-back failed or is unavailable
    NetworkUncached,
}

/// Entry name of a database path inside the OPFS root directory
pub fn opfs_entry_name(db_path: &str) -> &str {
    db_path.strip_prefix(OPFS_SCHEME).unwrap_or(db_path)
}

/// Entry name of the database's write-ahead log
pub fn opfs_wal_entry_name(db_path: &str) -> String {
    format!("{}{}", opfs_entry_name(db_path), WAL_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_opfs_scheme() {
        assert_eq!(opfs_entry_name("opfs://duckdbwasm-example.db"), "duckdbwasm-example.db");
        assert_eq!(opfs_entry_name("plain.db"), "plain.db");
    }

    #[test]
    fn wal_sits_next_to_database() {
        assert_eq!(
            opfs_wal_entry_name("opfs://duckdbwasm-example.db"),
            "duckdbwasm-example.db.wal"
        );
    }
}
