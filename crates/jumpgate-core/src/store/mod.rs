//! SQLite-backed link store.
//!
//! Serves the raw data route searches are assembled from: static catalog rows
//! and collection-scoped systems/connections. Dynamic rows are filtered with a
//! [`LinkPredicate`] in Rust after a parameterized fetch, so no filter value is
//! ever spliced into SQL text.

pub mod schema;

use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::model::{
    CollectionId, CollectionIds, CollectionRecord, JumpRow, LinkPredicate, LinkRecord, LinkScope,
    LinkType, SystemRecord,
};
use crate::rows::assemble_dynamic_rows;
use schema::*;

/// Handle to a link store database.
pub struct LinkStore {
    conn: Connection,
}

impl std::fmt::Debug for LinkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl LinkStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| CoreError::open(path, e))?;
        Ok(Self { conn })
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create tables and indexes if missing and stamp the schema version.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA_CREATE_SYSTEM_NEIGHBOUR, [])?;
        self.conn.execute(SCHEMA_CREATE_COLLECTION, [])?;
        self.conn.execute(SCHEMA_CREATE_SYSTEM, [])?;
        self.conn.execute(SCHEMA_CREATE_CONNECTION, [])?;
        self.conn.execute(SCHEMA_CREATE_METADATA, [])?;
        self.conn.execute_batch(SCHEMA_CREATE_INDEXES)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO store_metadata (key, value) VALUES ('schema_version', ?1)",
            params![LINK_STORE_SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Stored schema version, if the store was initialized.
    pub fn schema_version(&self) -> Result<Option<String>> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='store_metadata'",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(None);
        }

        Ok(self
            .conn
            .query_row(
                "SELECT value FROM store_metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Fail unless the store carries the schema version of this build.
    pub fn check_schema(&self) -> Result<()> {
        match self.schema_version()? {
            Some(v) if v == LINK_STORE_SCHEMA_VERSION => Ok(()),
            found => Err(CoreError::SchemaVersion {
                expected: LINK_STORE_SCHEMA_VERSION.to_string(),
                found: found.unwrap_or_else(|| "none".to_string()),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// All static catalog rows.
    pub fn static_rows(&self) -> Result<Vec<JumpRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT system_id, name, region_id, constellation_id, security, jump_nodes
             FROM system_neighbour ORDER BY system_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(JumpRow {
                    system_id: row.get::<_, i64>(0)? as u64,
                    name: row.get(1)?,
                    region_id: row.get::<_, i64>(2)? as u64,
                    constellation_id: row.get::<_, i64>(3)? as u64,
                    security: row.get(4)?,
                    jump_nodes: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Loaded {} static rows", rows.len());
        Ok(rows)
    }

    /// Rows for active systems of active `collections`, keeping links that
    /// `predicate` accepts.
    pub fn dynamic_rows(
        &self,
        collections: &CollectionIds,
        predicate: &LinkPredicate,
    ) -> Result<Vec<JumpRow>> {
        if collections.is_empty() || predicate.is_empty() {
            return Ok(Vec::new());
        }

        let systems = self.systems(collections)?;
        let links = self.links(collections)?;
        let rows = assemble_dynamic_rows(&systems, &links, collections, predicate);

        debug!(
            "Assembled {} dynamic rows from {} systems / {} links",
            rows.len(),
            systems.len(),
            links.len()
        );
        Ok(rows)
    }

    /// Systems placed on active `collections`.
    pub fn systems(&self, collections: &CollectionIds) -> Result<Vec<SystemRecord>> {
        let sql = format!(
            "SELECT {SYSTEM_COLUMNS} FROM system s
             INNER JOIN collection c ON c.id = s.collection_id
             WHERE s.collection_id IN ({}) AND c.active = 1
             ORDER BY s.id",
            placeholders(collections.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let systems = stmt
            .query_map(params_from_iter(collections.iter().map(|id| id as i64)), |row| {
                Ok(SystemRecord {
                    key: row.get::<_, i64>(0)? as u64,
                    collection_id: row.get::<_, i64>(1)? as u64,
                    system_id: row.get::<_, i64>(2)? as u64,
                    name: row.get(3)?,
                    region_id: row.get::<_, i64>(4)? as u64,
                    constellation_id: row.get::<_, i64>(5)? as u64,
                    security: row.get(6)?,
                    active: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(systems)
    }

    /// Active connections of `collections`.
    pub fn links(&self, collections: &CollectionIds) -> Result<Vec<LinkRecord>> {
        let sql = format!(
            "SELECT {CONNECTION_COLUMNS} FROM connection
             WHERE collection_id IN ({}) AND active = 1
             ORDER BY id",
            placeholders(collections.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(collections.iter().map(|id| id as i64)), |row| {
                Ok(RawLink {
                    id: row.get(0)?,
                    collection_id: row.get(1)?,
                    source: row.get(2)?,
                    target: row.get(3)?,
                    scope: row.get(4)?,
                    types: row.get(5)?,
                    eol: row.get(6)?,
                    active: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter().map(RawLink::into_record).collect()
    }

    /// Look up a collection by id.
    pub fn collection(&self, id: CollectionId) -> Result<Option<CollectionRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, active FROM collection WHERE id = ?1",
                params![id as i64],
                |row| {
                    Ok(CollectionRecord {
                        id: row.get::<_, i64>(0)? as u64,
                        name: row.get(1)?,
                        active: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Insert or replace a static catalog row.
    pub fn insert_static_row(&self, row: &JumpRow) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO system_neighbour
             (system_id, name, region_id, constellation_id, security, jump_nodes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.system_id as i64,
                row.name,
                row.region_id as i64,
                row.constellation_id as i64,
                row.security,
                row.jump_nodes
            ],
        )?;
        Ok(())
    }

    /// Insert or replace a collection.
    pub fn insert_collection(&self, record: &CollectionRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO collection (id, name, active) VALUES (?1, ?2, ?3)",
            params![record.id as i64, record.name, record.active],
        )?;
        Ok(())
    }

    /// Place a system on a collection. The row key is assigned by the store
    /// (`system.key` is ignored) and returned.
    pub fn insert_system(&self, system: &SystemRecord) -> Result<u64> {
        self.conn.execute(
            "INSERT INTO system
             (collection_id, system_id, name, region_id, constellation_id, security, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                system.collection_id as i64,
                system.system_id as i64,
                system.name,
                system.region_id as i64,
                system.constellation_id as i64,
                system.security,
                system.active
            ],
        )?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    /// Insert a connection between two system row keys.
    pub fn insert_link(&self, link: &LinkRecord) -> Result<i64> {
        let types = serde_json::to_string(&link.types)
            .map_err(|source| CoreError::InvalidLinkTypes { id: 0, source })?;
        self.conn.execute(
            "INSERT INTO connection (collection_id, source, target, scope, types, eol, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                link.collection_id as i64,
                link.source as i64,
                link.target as i64,
                link.scope.as_str(),
                types,
                link.eol,
                link.active
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

/// Connection row as read, before scope/type decoding.
struct RawLink {
    id: i64,
    collection_id: i64,
    source: i64,
    target: i64,
    scope: String,
    types: String,
    eol: bool,
    active: bool,
}

impl RawLink {
    fn into_record(self) -> Result<LinkRecord> {
        let scope: LinkScope = self.scope.parse().map_err(|scope| CoreError::UnknownScope {
            id: self.id,
            scope,
        })?;
        let types: Vec<LinkType> = serde_json::from_str(&self.types)
            .map_err(|source| CoreError::InvalidLinkTypes { id: self.id, source })?;

        Ok(LinkRecord {
            collection_id: self.collection_id as u64,
            source: self.source as u64,
            target: self.target as u64,
            scope,
            types,
            eol: self.eol,
            active: self.active,
        })
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkFilterSpec;
    use pretty_assertions::assert_eq;

    fn store() -> LinkStore {
        let store = LinkStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    fn system(collection_id: u64, system_id: u64, name: &str) -> SystemRecord {
        SystemRecord {
            key: 0,
            collection_id,
            system_id,
            name: name.to_string(),
            region_id: 10,
            constellation_id: 20,
            security: 0.5,
            active: true,
        }
    }

    fn link(collection_id: u64, source: u64, target: u64, types: &[LinkType]) -> LinkRecord {
        LinkRecord {
            collection_id,
            source,
            target,
            scope: LinkScope::Wormhole,
            types: types.to_vec(),
            eol: false,
            active: true,
        }
    }

    #[test]
    fn test_schema_version_stamped() {
        let store = LinkStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), None);
        assert!(store.check_schema().is_err());

        store.init_schema().unwrap();
        assert_eq!(
            store.schema_version().unwrap().as_deref(),
            Some(LINK_STORE_SCHEMA_VERSION)
        );
        store.check_schema().unwrap();
    }

    #[test]
    fn test_static_rows_roundtrip() {
        let store = store();
        let row = JumpRow {
            system_id: 30000142,
            name: "Jita".into(),
            region_id: 10000002,
            constellation_id: 20000020,
            security: 0.946,
            jump_nodes: "Perimeter:New Caldari".into(),
        };
        store.insert_static_row(&row).unwrap();

        assert_eq!(store.static_rows().unwrap(), vec![row]);
    }

    #[test]
    fn test_dynamic_rows_filtered() {
        let store = store();
        store
            .insert_collection(&CollectionRecord {
                id: 1,
                name: "Home".into(),
                active: true,
            })
            .unwrap();
        let a = store.insert_system(&system(1, 31000001, "J100001")).unwrap();
        let b = store.insert_system(&system(1, 31000002, "J100002")).unwrap();
        let c = store.insert_system(&system(1, 31000003, "J100003")).unwrap();
        store
            .insert_link(&link(1, a, b, &[LinkType::WormholeFresh]))
            .unwrap();
        store
            .insert_link(&link(1, b, c, &[LinkType::WormholeFresh, LinkType::Frigate]))
            .unwrap();

        let ids = CollectionIds::from_raw([1]);
        let spec = LinkFilterSpec {
            wormholes: true,
            ..Default::default()
        };
        let rows = store.dynamic_rows(&ids, &spec.predicate()).unwrap();
        let pairs: Vec<_> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.jump_nodes.as_str()))
            .collect();
        assert_eq!(pairs, vec![("J100001", "J100002"), ("J100002", "J100001")]);

        let spec = LinkFilterSpec {
            wormholes: true,
            wormholes_frigate: true,
            ..Default::default()
        };
        let rows = store.dynamic_rows(&ids, &spec.predicate()).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_dynamic_rows_skip_inactive_collection() {
        let store = store();
        store
            .insert_collection(&CollectionRecord {
                id: 2,
                name: "Archived".into(),
                active: false,
            })
            .unwrap();
        let a = store.insert_system(&system(2, 1, "A")).unwrap();
        let b = store.insert_system(&system(2, 2, "B")).unwrap();
        store
            .insert_link(&link(2, a, b, &[LinkType::WormholeFresh]))
            .unwrap();

        let spec = LinkFilterSpec {
            wormholes: true,
            ..Default::default()
        };
        let rows = store
            .dynamic_rows(&CollectionIds::from_raw([2]), &spec.predicate())
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unknown_scope_rejected() {
        let store = store();
        store
            .insert_collection(&CollectionRecord {
                id: 1,
                name: "Home".into(),
                active: true,
            })
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO connection (collection_id, source, target, scope) VALUES (1, 1, 2, 'portal')",
                [],
            )
            .unwrap();

        let err = store.links(&CollectionIds::from_raw([1])).unwrap_err();
        assert!(matches!(err, CoreError::UnknownScope { .. }));
    }

    #[test]
    fn test_collection_lookup() {
        let store = store();
        assert!(store.collection(9).unwrap().is_none());

        let record = CollectionRecord {
            id: 9,
            name: "Staging".into(),
            active: true,
        };
        store.insert_collection(&record).unwrap();
        assert_eq!(store.collection(9).unwrap(), Some(record));
    }
}
