//! Entry point to a persistent collection store.

use std::path::Path;

use sociachat_core::model::{CollectionInfo, DistanceSpace};
use sociachat_core::schema::Database;

use crate::collection::Collection;
use crate::embedding::{Embedder, HashEmbedder};
use crate::error::{StoreError, StoreResult};

/// A handle on a store file and the embedder used for every collection in it.
///
/// Collections borrow from the client, so a client must outlive the
/// handles it hands out.
#[derive(Debug)]
pub struct Client {
    db: Database,
    embedder: Box<dyn Embedder>,
}

impl Client {
    /// Open (or create) the store at `path` with the default embedder.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::open(path)?;
        Ok(Self::from_database(db))
    }

    /// Open a throwaway in-memory store (for tests).
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_database(db))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db,
            embedder: Box::new(HashEmbedder::default()),
        }
    }

    /// Replace the embedder used for adding and querying documents.
    #[must_use]
    pub fn with_embedder(mut self, embedder: impl Embedder + 'static) -> Self {
        self.embedder = Box::new(embedder);
        self
    }

    /// Create a new collection. Fails if the name is already taken.
    pub fn create_collection(
        &self,
        name: &str,
        space: DistanceSpace,
    ) -> StoreResult<Collection<'_>> {
        if self.db.find_collection(name)?.is_some() {
            return Err(StoreError::CollectionExists {
                name: name.to_string(),
            });
        }

        let info = CollectionInfo::new(
            name,
            space,
            self.embedder.dimensions(),
            self.embedder.name(),
        );
        self.db.insert_collection(&info).map_err(|e| match e {
            sociachat_core::Error::AlreadyExists { .. } => StoreError::CollectionExists {
                name: name.to_string(),
            },
            other => StoreError::Database(other),
        })?;

        log::info!(
            "Created collection {} ({} space, {} embedder)",
            name,
            space,
            info.embedder
        );
        Ok(Collection::new(info, &self.db, self.embedder.as_ref()))
    }

    /// Open an existing collection.
    pub fn get_collection(&self, name: &str) -> StoreResult<Collection<'_>> {
        let info = self
            .db
            .find_collection(name)?
            .ok_or_else(|| StoreError::CollectionNotFound {
                name: name.to_string(),
            })?;

        if info.embedder != self.embedder.name() {
            return Err(StoreError::EmbedderMismatch {
                collection: info.name,
                expected: info.embedder,
                actual: self.embedder.name().to_string(),
            });
        }
        if info.dimensions != self.embedder.dimensions() {
            return Err(StoreError::DimensionMismatch {
                collection: info.name,
                expected: info.dimensions,
                actual: self.embedder.dimensions(),
            });
        }

        Ok(Collection::new(info, &self.db, self.embedder.as_ref()))
    }

    /// Open `name`, creating it in `space` only when it does not exist yet.
    ///
    /// `space` is ignored for an existing collection.
    pub fn get_or_create_collection(
        &self,
        name: &str,
        space: DistanceSpace,
    ) -> StoreResult<Collection<'_>> {
        match self.get_collection(name) {
            Err(StoreError::CollectionNotFound { .. }) => self.create_collection(name, space),
            result => result,
        }
    }

    /// List every collection in the store.
    pub fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        Ok(self.db.list_collections()?)
    }

    /// Count the documents of a listed collection without opening it.
    ///
    /// Works whichever embedder built the collection.
    pub fn document_count(&self, info: &CollectionInfo) -> StoreResult<usize> {
        Ok(self.db.count_documents(&info.id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_get() {
        let client = Client::open_in_memory().unwrap();
        let created = client.create_collection("politik2", DistanceSpace::L2).unwrap();
        let opened = client.get_collection("politik2").unwrap();
        assert_eq!(created.info().id, opened.info().id);
    }

    #[test]
    fn test_create_existing_is_typed_error() {
        let client = Client::open_in_memory().unwrap();
        client.create_collection("politik2", DistanceSpace::L2).unwrap();

        let err = client
            .create_collection("politik2", DistanceSpace::L2)
            .unwrap_err();
        assert!(matches!(err, StoreError::CollectionExists { .. }));
    }

    #[test]
    fn test_get_missing_is_typed_error() {
        let client = Client::open_in_memory().unwrap();
        let err = client.get_collection("missing").unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound { .. }));
    }

    #[test]
    fn test_get_or_create_reuses_existing() {
        let client = Client::open_in_memory().unwrap();
        let first = client
            .get_or_create_collection("politik2", DistanceSpace::Cosine)
            .unwrap();
        let second = client
            .get_or_create_collection("politik2", DistanceSpace::L2)
            .unwrap();

        assert_eq!(first.info().id, second.info().id);
        assert_eq!(second.info().space, DistanceSpace::Cosine);
        assert_eq!(client.list_collections().unwrap().len(), 1);
    }

    #[test]
    fn test_dimension_mismatch_on_open() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        {
            let client = Client::open(&path).unwrap();
            client.create_collection("c", DistanceSpace::L2).unwrap();
        }

        let client = Client::open(&path)
            .unwrap()
            .with_embedder(HashEmbedder::new(16));
        let err = client.get_collection("c").unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 384,
                actual: 16,
                ..
            }
        ));
    }

    #[derive(Debug)]
    struct OtherEmbedder(HashEmbedder);

    impl Embedder for OtherEmbedder {
        fn embed(&self, text: &str) -> StoreResult<Vec<f32>> {
            self.0.embed(text)
        }

        fn dimensions(&self) -> usize {
            self.0.dimensions()
        }

        fn name(&self) -> &str {
            "other"
        }
    }

    #[test]
    fn test_collection_records_embedder() {
        let client = Client::open_in_memory().unwrap();
        let created = client.create_collection("politik2", DistanceSpace::L2).unwrap();
        assert_eq!(created.info().embedder, "hash");
    }

    #[test]
    fn test_embedder_mismatch_on_open() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        {
            let client = Client::open(&path).unwrap();
            client.create_collection("c", DistanceSpace::L2).unwrap();
        }

        // Same dimensions, different model: vectors are not comparable.
        let client = Client::open(&path)
            .unwrap()
            .with_embedder(OtherEmbedder(HashEmbedder::default()));
        let err = client.get_collection("c").unwrap_err();
        assert!(matches!(
            err,
            StoreError::EmbedderMismatch { ref expected, ref actual, .. }
                if expected == "hash" && actual == "other"
        ));
    }

    #[test]
    fn test_document_count_ignores_embedder() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        {
            let client = Client::open(&path).unwrap();
            let collection = client.create_collection("c", DistanceSpace::L2).unwrap();
            collection
                .add(
                    &["halo".to_string()],
                    &[sociachat_core::model::Metadata::new()],
                    &["0".to_string()],
                )
                .unwrap();
        }

        let client = Client::open(&path)
            .unwrap()
            .with_embedder(OtherEmbedder(HashEmbedder::default()));
        let info = &client.list_collections().unwrap()[0];
        assert_eq!(client.document_count(info).unwrap(), 1);
    }
}
