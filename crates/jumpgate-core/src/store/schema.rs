//! SQLite schema for the link store.
//!
//! The store holds two kinds of data:
//! - `system_neighbour`: the fixed catalog graph, one pre-aggregated row per node
//! - `collection` / `system` / `connection`: user-managed maps whose links change often

/// Schema version stamped into `store_metadata`
pub const LINK_STORE_SCHEMA_VERSION: &str = "1.0";

/// SQL to create the static catalog table
///
/// `jump_nodes` is the colon-separated list of neighbor names.
pub const SCHEMA_CREATE_SYSTEM_NEIGHBOUR: &str = r#"
CREATE TABLE IF NOT EXISTS system_neighbour (
    system_id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL,
    constellation_id INTEGER NOT NULL,
    security REAL NOT NULL,
    jump_nodes TEXT NOT NULL
)
"#;

/// SQL to create the collection table
pub const SCHEMA_CREATE_COLLECTION: &str = r#"
CREATE TABLE IF NOT EXISTS collection (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
)
"#;

/// SQL to create the per-collection system table
///
/// `id` is the row key referenced by connections; `system_id` is the catalog id.
pub const SCHEMA_CREATE_SYSTEM: &str = r#"
CREATE TABLE IF NOT EXISTS system (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id INTEGER NOT NULL REFERENCES collection(id),
    system_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL,
    constellation_id INTEGER NOT NULL,
    security REAL NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
)
"#;

/// SQL to create the connection table
///
/// `types` is a JSON array of type tags (e.g. `["wh_fresh", "frigate"]`).
pub const SCHEMA_CREATE_CONNECTION: &str = r#"
CREATE TABLE IF NOT EXISTS connection (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id INTEGER NOT NULL REFERENCES collection(id),
    source INTEGER NOT NULL REFERENCES system(id),
    target INTEGER NOT NULL REFERENCES system(id),
    scope TEXT NOT NULL,
    types TEXT NOT NULL DEFAULT '[]',
    eol INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1
)
"#;

/// SQL to create indexes for collection-scoped lookups
pub const SCHEMA_CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_system_collection ON system(collection_id);
CREATE INDEX IF NOT EXISTS idx_connection_collection ON connection(collection_id);
CREATE INDEX IF NOT EXISTS idx_connection_source ON connection(source);
CREATE INDEX IF NOT EXISTS idx_connection_target ON connection(target);
"#;

/// SQL to create the metadata table
pub const SCHEMA_CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS store_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)
"#;

/// Column names for system queries (in order for row mapping)
pub const SYSTEM_COLUMNS: &str =
    "s.id, s.collection_id, s.system_id, s.name, s.region_id, s.constellation_id, s.security, s.active";

/// Column names for connection queries (in order for row mapping)
pub const CONNECTION_COLUMNS: &str = "id, collection_id, source, target, scope, types, eol, active";
