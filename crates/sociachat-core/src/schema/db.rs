use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::document::{decode_embedding, encode_embedding};
use crate::model::{CollectionId, CollectionInfo, DistanceSpace, Metadata, StoredDocument};

use super::migrations::MIGRATIONS;

/// A database connection holding collections and their documents.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Collection CRUD
impl Database {
    /// Insert a new collection.
    ///
    /// Fails with [`Error::AlreadyExists`] when the name is taken.
    pub fn insert_collection(&self, collection: &CollectionInfo) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO collections (id, name, space, dimensions, embedder, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                collection.id.to_string(),
                collection.name,
                collection.space.as_str(),
                i64::try_from(collection.dimensions).unwrap_or(i64::MAX),
                collection.embedder,
                collection.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists {
                    entity: "collection",
                    id: collection.name.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a collection by name.
    pub fn find_collection(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let collection = self
            .conn
            .query_row(
                "SELECT id, name, space, dimensions, embedder, created_at
                 FROM collections
                 WHERE name = ?1",
                [name],
                |row| Self::row_to_collection(row),
            )
            .optional()?;
        Ok(collection)
    }

    /// List every collection, oldest first.
    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, space, dimensions, embedder, created_at
             FROM collections
             ORDER BY created_at, name",
        )?;

        let collections = stmt
            .query_map([], |row| Self::row_to_collection(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(collections)
    }

    fn row_to_collection(row: &rusqlite::Row) -> rusqlite::Result<CollectionInfo> {
        use chrono::DateTime;

        let id_str: String = row.get(0)?;
        let space_str: String = row.get(2)?;
        let dimensions: i64 = row.get(3)?;
        let created_at_str: String = row.get(5)?;

        Ok(CollectionInfo {
            id: CollectionId::parse(&id_str).map_err(|e| conversion_failure(0, Type::Text, e))?,
            name: row.get(1)?,
            space: space_str
                .parse::<DistanceSpace>()
                .map_err(|e| conversion_failure(2, Type::Text, e))?,
            dimensions: usize::try_from(dimensions).unwrap_or(0),
            embedder: row.get(4)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| conversion_failure(5, Type::Text, e))?
                .into(),
        })
    }
}

// Document CRUD
impl Database {
    /// Insert documents, skipping ids that already exist in the collection.
    ///
    /// Runs in a single transaction. Returns the number of rows inserted.
    pub fn insert_documents(
        &self,
        collection_id: &CollectionId,
        documents: &[StoredDocument],
    ) -> Result<usize> {
        self.write_documents(
            collection_id,
            documents,
            "INSERT OR IGNORE INTO embeddings (collection_id, doc_id, document, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
    }

    /// Insert documents, replacing the text, metadata and embedding of ids
    /// that already exist. Replaced rows keep their insertion position.
    pub fn upsert_documents(
        &self,
        collection_id: &CollectionId,
        documents: &[StoredDocument],
    ) -> Result<usize> {
        self.write_documents(
            collection_id,
            documents,
            "INSERT INTO embeddings (collection_id, doc_id, document, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (collection_id, doc_id) DO UPDATE SET
                document = excluded.document,
                metadata = excluded.metadata,
                embedding = excluded.embedding",
        )
    }

    fn write_documents(
        &self,
        collection_id: &CollectionId,
        documents: &[StoredDocument],
        sql: &str,
    ) -> Result<usize> {
        let collection_id = collection_id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(sql)?;
            for doc in documents {
                written += stmt.execute(rusqlite::params![
                    collection_id,
                    doc.id,
                    doc.document,
                    serde_json::to_string(&doc.metadata)?,
                    encode_embedding(&doc.embedding),
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Count the documents in a collection.
    pub fn count_documents(&self, collection_id: &CollectionId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection_id = ?1",
            [collection_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Visit every document in a collection in insertion order.
    ///
    /// Rows are decoded one at a time; nothing beyond the current row is
    /// held in memory.
    pub fn for_each_document<F>(&self, collection_id: &CollectionId, mut visit: F) -> Result<()>
    where
        F: FnMut(StoredDocument),
    {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, document, metadata, embedding
             FROM embeddings
             WHERE collection_id = ?1
             ORDER BY seq",
        )?;

        let mut rows = stmt.query([collection_id.to_string()])?;
        while let Some(row) = rows.next()? {
            visit(Self::row_to_document(row)?);
        }

        Ok(())
    }

    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<StoredDocument> {
        let metadata_str: String = row.get(2)?;
        let blob: Vec<u8> = row.get(3)?;

        let metadata: Metadata = serde_json::from_str(&metadata_str)
            .map_err(|e| conversion_failure(2, Type::Text, e))?;
        let embedding = decode_embedding(&blob).ok_or_else(|| {
            conversion_failure(
                3,
                Type::Blob,
                Error::InvalidData(format!(
                    "embedding blob of {} bytes is not a whole number of f32 values",
                    blob.len()
                )),
            )
        })?;

        Ok(StoredDocument {
            id: row.get(0)?,
            document: row.get(1)?,
            metadata,
            embedding,
        })
    }
}

fn conversion_failure(
    column: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> Metadata {
        let mut m = Metadata::new();
        m.insert("keyword".to_string(), json!("politik"));
        m
    }

    fn documents(db: &Database, collection_id: &CollectionId) -> Result<Vec<StoredDocument>> {
        let mut docs = Vec::new();
        db.for_each_document(collection_id, |doc| docs.push(doc))?;
        Ok(docs)
    }

    fn doc(id: &str, text: &str) -> StoredDocument {
        StoredDocument::new(id, text, metadata(), vec![1.0, 0.0, 0.5])
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_reopen_does_not_reapply_migrations() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        drop(Database::open(&path).unwrap());
        let db = Database::open(&path).unwrap();

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_upgrade_marks_existing_collections_as_hash() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(MIGRATIONS[0].sql).unwrap();
            conn.execute(
                "INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO collections (id, name, space, dimensions, created_at)
                 VALUES (?1, 'politik2', 'l2', 384, '2024-01-01T00:00:00+00:00')",
                [CollectionId::new().to_string()],
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let info = db.find_collection("politik2").unwrap().unwrap();
        assert_eq!(info.embedder, "hash");
        assert_eq!(info.dimensions, 384);
    }

    #[test]
    fn test_collection_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let info = CollectionInfo::new("politik2", DistanceSpace::Cosine, 3, "hash");

        db.insert_collection(&info).unwrap();

        let found = db.find_collection("politik2").unwrap().unwrap();
        assert_eq!(found.id, info.id);
        assert_eq!(found.space, DistanceSpace::Cosine);
        assert_eq!(found.dimensions, 3);
        assert!(db.find_collection("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_collection_name_is_typed_error() {
        let db = Database::open_in_memory().unwrap();
        db.insert_collection(&CollectionInfo::new("dup", DistanceSpace::L2, 3, "hash"))
            .unwrap();

        let err = db
            .insert_collection(&CollectionInfo::new("dup", DistanceSpace::L2, 3, "hash"))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { entity: "collection", .. }));
    }

    #[test]
    fn test_insert_documents_skips_existing_ids() {
        let db = Database::open_in_memory().unwrap();
        let info = CollectionInfo::new("c", DistanceSpace::L2, 3, "hash");
        db.insert_collection(&info).unwrap();

        let inserted = db
            .insert_documents(&info.id, &[doc("0", "first"), doc("1", "second")])
            .unwrap();
        assert_eq!(inserted, 2);

        let inserted = db
            .insert_documents(&info.id, &[doc("1", "changed"), doc("2", "third")])
            .unwrap();
        assert_eq!(inserted, 1);

        let docs = documents(&db, &info.id).unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.document.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_upsert_documents_replaces_in_place() {
        let db = Database::open_in_memory().unwrap();
        let info = CollectionInfo::new("c", DistanceSpace::L2, 3, "hash");
        db.insert_collection(&info).unwrap();

        db.insert_documents(&info.id, &[doc("0", "first"), doc("1", "second")])
            .unwrap();
        db.upsert_documents(&info.id, &[doc("0", "replaced")]).unwrap();

        let docs = documents(&db, &info.id).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "0");
        assert_eq!(docs[0].document, "replaced");
        assert_eq!(docs[0].embedding, vec![1.0, 0.0, 0.5]);
        assert_eq!(docs[0].metadata, metadata());
    }

    #[test]
    fn test_documents_are_scoped_to_their_collection() {
        let db = Database::open_in_memory().unwrap();
        let a = CollectionInfo::new("a", DistanceSpace::L2, 3, "hash");
        let b = CollectionInfo::new("b", DistanceSpace::L2, 3, "hash");
        db.insert_collection(&a).unwrap();
        db.insert_collection(&b).unwrap();

        db.insert_documents(&a.id, &[doc("0", "only in a")]).unwrap();
        db.insert_documents(&b.id, &[doc("0", "only in b")]).unwrap();

        assert_eq!(db.count_documents(&a.id).unwrap(), 1);
        assert_eq!(db.count_documents(&b.id).unwrap(), 1);
        assert_eq!(documents(&db, &b.id).unwrap()[0].document, "only in b");
    }

    #[test]
    fn test_list_collections() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_collections().unwrap().is_empty());

        db.insert_collection(&CollectionInfo::new("one", DistanceSpace::L2, 3, "hash"))
            .unwrap();
        db.insert_collection(&CollectionInfo::new("two", DistanceSpace::Ip, 3, "hash"))
            .unwrap();

        let names: Vec<String> = db
            .list_collections()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"one".to_string()));
        assert!(names.contains(&"two".to_string()));
    }
}
