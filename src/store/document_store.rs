//! # Document Store
//!
//! One store owns one type namespace: a directory of `<id>.<type>` files
//! plus its entries in a shared cache. The file is always canonical; the
//! cache is consulted first and refreshed on every miss.
//!
//! Composite operations are plain sequences of file steps:
//!
//! - `update` = get, merge, remove, create
//! - `clone`  = get, merge overrides, create
//! - `rename` = clone, remove
//!
//! An interrupted `update` leaves the record only in its backup file; see
//! [`DocumentStore::restore`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use rand::seq::SliceRandom;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::DocumentCache;
use crate::document::{
    generate_id, timestamp_after, timestamp_now, Document, Pick, ID_FIELD, LASTUPDATE_FIELD,
    SINCE_FIELD, TYPE_FIELD,
};
use crate::observability::Event;
use crate::schema::{validate_type_name, DefaultsFn, DocumentSchema};

use super::backend::StorageBackend;
use super::config::StoreOptions;
use super::errors::{StoreError, StoreResult};
use super::local::LocalBackend;
use super::paths::StorePaths;
use super::query::{Logic, QueryEvaluator, Where};

/// Fields kept on every document whatever the schema declares
const RESERVED_FIELDS: [&str; 4] = [ID_FIELD, TYPE_FIELD, SINCE_FIELD, LASTUPDATE_FIELD];

/// Cached, file-backed store for one document type
pub struct DocumentStore {
    doc_type: String,
    autoid: bool,
    schema: DocumentSchema,
    defaults: DefaultsFn,
    paths: StorePaths,
    cache: Arc<dyn DocumentCache>,
    backend: Arc<dyn StorageBackend>,
}

impl DocumentStore {
    /// Open a store on the local filesystem
    pub async fn open(options: StoreOptions, cache: Arc<dyn DocumentCache>) -> StoreResult<Self> {
        Self::open_with_backend(options, cache, Arc::new(LocalBackend::new())).await
    }

    /// Open a store on an arbitrary backend.
    ///
    /// Fails with a fatal `CONFIG` error when the type, schema or defaults
    /// are missing. Creates the storage directory.
    pub async fn open_with_backend(
        options: StoreOptions,
        cache: Arc<dyn DocumentCache>,
        backend: Arc<dyn StorageBackend>,
    ) -> StoreResult<Self> {
        let StoreOptions {
            doc_type,
            autoid,
            storage_path,
            schema,
            defaults,
        } = options;

        if doc_type.is_empty() {
            return Err(StoreError::config("missing document type"));
        }
        validate_type_name(&doc_type)?;

        let schema = schema
            .ok_or_else(|| StoreError::config(format!("missing schema for type '{}'", doc_type)))?;
        let defaults = defaults
            .ok_or_else(|| StoreError::config(format!("missing defaults for type '{}'", doc_type)))?;
        schema
            .validate_structure()
            .map_err(|reason| StoreError::config(format!("type '{}': {}", doc_type, reason)))?;

        backend
            .create_dir_all(&storage_path)
            .await
            .map_err(|e| StoreError::io(&storage_path, e))?;

        info!(
            event = %Event::StoreOpened,
            doc_type = %doc_type,
            storage_path = %storage_path.display(),
            autoid,
            "document store opened"
        );

        Ok(Self {
            paths: StorePaths::new(storage_path, &doc_type),
            doc_type,
            autoid,
            schema,
            defaults,
            cache,
            backend,
        })
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn autoid(&self) -> bool {
        self.autoid
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn storage_path(&self) -> &Path {
        self.paths.root()
    }

    /// File extension including the leading dot
    pub fn extension(&self) -> &str {
        self.paths.ext()
    }

    pub fn cache_key(&self, id: &str) -> String {
        self.paths.key(id)
    }

    pub fn filename(&self, id: &str) -> PathBuf {
        self.paths.filename(id)
    }

    pub fn backup_filename(&self, id: &str) -> PathBuf {
        self.paths.backup_filename(id)
    }

    /// `{field:type, ...}` in declaration order
    pub fn schema_description(&self) -> String {
        self.schema.describe()
    }

    // ========== Single document operations ==========

    /// True if the document is cached or its file exists
    pub async fn exists(&self, id: &str) -> StoreResult<bool> {
        require_id(id)?;
        if self.cache.get(&self.paths.key(id)).is_some() {
            return Ok(true);
        }
        self.file_exists(&self.paths.filename(id)).await
    }

    /// Store a new document.
    ///
    /// The record is `{type} ∪ defaults ∪ doc`, restricted to declared
    /// fields. Without an id, one is generated when auto-id is enabled.
    pub async fn create(&self, doc: Document) -> StoreResult<Document> {
        let id = match doc.id() {
            Some(id) => id.to_string(),
            None if self.autoid => generate_id(),
            None => return Err(StoreError::MissingParams { param: "id" }),
        };
        require_id(&id)?;

        if self.exists(&id).await? {
            return Err(StoreError::Duplicate { id });
        }

        let mut record = Document::new().with(TYPE_FIELD, self.doc_type.as_str());
        record.merge(&(self.defaults)());
        record.merge(&doc);
        record.insert(ID_FIELD, id.as_str());
        record.insert(TYPE_FIELD, self.doc_type.as_str());

        if !record.get(SINCE_FIELD).map_or(false, Value::is_string) {
            record.insert(SINCE_FIELD, timestamp_now());
        }
        if !record.get(LASTUPDATE_FIELD).map_or(false, Value::is_string) {
            let since = record.get(SINCE_FIELD).cloned().unwrap_or(Value::Null);
            record.insert(LASTUPDATE_FIELD, since);
        }

        let schema = &self.schema;
        record.retain(|field| RESERVED_FIELDS.contains(&field) || schema.contains(field));

        self.write_document(&id, &record).await?;
        self.cache.set(&self.paths.key(&id), &record);

        info!(
            event = %Event::DocumentCreated,
            doc_type = %self.doc_type,
            id = %id,
            "document created"
        );
        Ok(record)
    }

    /// Read a document, from the cache when possible
    pub async fn get(&self, id: &str, pick: &Pick) -> StoreResult<Document> {
        require_id(id)?;
        if let Some(cached) = self.cache.get(&self.paths.key(id)) {
            return Ok(pick.apply(cached));
        }
        let document = self.load(id).await?;
        Ok(pick.apply(document))
    }

    /// Like [`get`](Self::get), but a document that cannot be read
    /// resolves to `None`. An empty or invalid id is still an error.
    pub async fn get_if_exists(&self, id: &str, pick: &Pick) -> StoreResult<Option<Document>> {
        match self.get(id, pick).await {
            Ok(document) => Ok(Some(document)),
            Err(err @ (StoreError::MissingParams { .. } | StoreError::InvalidId { .. })) => {
                Err(err)
            }
            Err(err) => {
                debug!(
                    event = %Event::BulkItemSkipped,
                    doc_type = %self.doc_type,
                    id = %id,
                    code = err.code(),
                    "document not readable"
                );
                Ok(None)
            }
        }
    }

    /// Read a document from its file, bypassing the cache, and refresh the
    /// cache with it
    pub async fn load(&self, id: &str) -> StoreResult<Document> {
        require_id(id)?;
        let path = self.paths.filename(id);
        let key = self.paths.key(id);

        let bytes = match self.backend.read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.cache.delete(&key);
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Err(e) => return Err(self.loading_failed(id, path, e.to_string())),
        };

        let document = match parse_document(&bytes) {
            Ok(document) => document,
            Err(reason) => return Err(self.loading_failed(id, path, reason)),
        };

        self.cache.set(&key, &document);
        debug!(
            event = %Event::DocumentLoaded,
            doc_type = %self.doc_type,
            id = %id,
            "document loaded"
        );
        Ok(document)
    }

    /// Merge `doc` over the stored document and stamp `lastupdate`.
    ///
    /// Runs as remove then create. If the create fails, the previous
    /// version survives only as the backup file.
    pub async fn update(&self, doc: Document) -> StoreResult<Document> {
        let id = doc
            .id()
            .ok_or(StoreError::MissingParams { param: "id" })?
            .to_string();

        let mut record = self.get(&id, &Pick::all()).await?;
        let lastupdate = timestamp_after(record.get(LASTUPDATE_FIELD));
        record.merge(&doc);
        record.insert(LASTUPDATE_FIELD, lastupdate);

        self.remove(&id).await?;

        match self.create(record).await {
            Ok(updated) => {
                info!(
                    event = %Event::DocumentUpdated,
                    doc_type = %self.doc_type,
                    id = %id,
                    "document updated"
                );
                Ok(updated)
            }
            Err(err) => {
                error!(
                    event = %Event::UpdateInterrupted,
                    doc_type = %self.doc_type,
                    id = %id,
                    backup = %self.paths.backup_filename(&id).display(),
                    error = %err,
                    "update removed the document but could not recreate it"
                );
                Err(err)
            }
        }
    }

    /// Create the document if its id is new; otherwise update it when
    /// `merge` is set, or return it unchanged.
    pub async fn stock(&self, doc: Document, merge: bool) -> StoreResult<Document> {
        let id = match doc.id() {
            Some(id) => id.to_string(),
            None => return self.create(doc).await,
        };

        if !self.exists(&id).await? {
            self.create(doc).await
        } else if merge {
            self.update(doc).await
        } else {
            self.get(&id, &Pick::all()).await
        }
    }

    /// Move the document to its backup file and evict it from the cache.
    ///
    /// Returns the document as it was before removal. Any previous backup
    /// is overwritten.
    pub async fn remove(&self, id: &str) -> StoreResult<Document> {
        let document = self.get(id, &Pick::all()).await?;
        self.backup(id).await?;
        self.cache.delete(&self.paths.key(id));

        info!(
            event = %Event::DocumentRemoved,
            doc_type = %self.doc_type,
            id = %id,
            "document removed"
        );
        Ok(document)
    }

    /// Like [`remove`](Self::remove), but failures resolve to `None`.
    /// An empty or invalid id is still an error.
    pub async fn remove_if_exists(&self, id: &str) -> StoreResult<Option<Document>> {
        match self.remove(id).await {
            Ok(document) => Ok(Some(document)),
            Err(err @ (StoreError::MissingParams { .. } | StoreError::InvalidId { .. })) => {
                Err(err)
            }
            Err(err) => {
                debug!(
                    event = %Event::BulkItemSkipped,
                    doc_type = %self.doc_type,
                    id = %id,
                    code = err.code(),
                    "document not removed"
                );
                Ok(None)
            }
        }
    }

    /// Bring the backup generation back as the live document
    pub async fn restore(&self, id: &str) -> StoreResult<Document> {
        if self.exists(id).await? {
            return Err(StoreError::Duplicate { id: id.to_string() });
        }

        let backup = self.paths.backup_filename(id);
        let path = self.paths.filename(id);
        match self.backend.rename(&backup, &path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Err(e) => return Err(StoreError::io(backup, e)),
        }

        let document = self.load(id).await?;
        info!(
            event = %Event::BackupRestored,
            doc_type = %self.doc_type,
            id = %id,
            "backup restored"
        );
        Ok(document)
    }

    pub async fn has_backup(&self, id: &str) -> StoreResult<bool> {
        require_id(id)?;
        self.file_exists(&self.paths.backup_filename(id)).await
    }

    // ========== Composite operations ==========

    /// Copy `from_id` to `to_id`, applying `overrides` on top
    pub async fn clone_document(
        &self,
        from_id: &str,
        to_id: &str,
        overrides: Option<&Document>,
    ) -> StoreResult<Document> {
        if from_id.is_empty() {
            return Err(StoreError::MissingParams { param: "from_id" });
        }
        if to_id.is_empty() {
            return Err(StoreError::MissingParams { param: "to_id" });
        }
        require_id(to_id)?;

        let mut record = self.get(from_id, &Pick::all()).await?;
        if let Some(overrides) = overrides {
            record.merge(overrides);
        }
        record.insert(ID_FIELD, to_id);

        let cloned = self.create(record).await?;
        info!(
            event = %Event::DocumentCloned,
            doc_type = %self.doc_type,
            from = %from_id,
            to = %to_id,
            "document cloned"
        );
        Ok(cloned)
    }

    /// Clone then remove the origin.
    ///
    /// If the clone fails nothing has changed. If the removal fails the
    /// document exists under both ids (`REMOVE`), or under the new id only
    /// because the origin vanished in between (`CLONE`).
    pub async fn rename(&self, from_id: &str, to_id: &str) -> StoreResult<Document> {
        let renamed = self.clone_document(from_id, to_id, None).await?;

        match self.remove(from_id).await {
            Ok(_) => {
                info!(
                    event = %Event::DocumentRenamed,
                    doc_type = %self.doc_type,
                    from = %from_id,
                    to = %to_id,
                    "document renamed"
                );
                Ok(renamed)
            }
            Err(StoreError::NotFound { .. }) => {
                warn!(
                    event = %Event::RenameInterrupted,
                    doc_type = %self.doc_type,
                    from = %from_id,
                    to = %to_id,
                    "origin vanished after clone"
                );
                Err(StoreError::Clone {
                    origin: from_id.to_string(),
                    destination: to_id.to_string(),
                })
            }
            Err(err) => {
                error!(
                    event = %Event::RenameInterrupted,
                    doc_type = %self.doc_type,
                    from = %from_id,
                    to = %to_id,
                    error = %err,
                    "clone written but origin not removed"
                );
                Err(StoreError::Remove {
                    origin: from_id.to_string(),
                    destination: to_id.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    // ========== Listing and bulk operations ==========

    /// Ids of every canonical file in the storage directory, sorted
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let root = self.paths.root();
        let names = match self.backend.list(root).await {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::io(root, e)),
        };

        let mut keys: Vec<String> = names
            .iter()
            .filter_map(|name| self.paths.id_from_file_name(name))
            .map(str::to_string)
            .collect();
        keys.sort();
        Ok(keys)
    }

    pub async fn count(&self) -> StoreResult<usize> {
        Ok(self.keys().await?.len())
    }

    /// Read many documents, keeping input order and skipping the ones that
    /// cannot be read
    pub async fn get_list<S>(&self, ids: &[S], pick: &Pick) -> Vec<Document>
    where
        S: AsRef<str> + Sync,
    {
        let results = join_all(ids.iter().map(|id| self.get_if_exists(id.as_ref(), pick))).await;
        results
            .into_iter()
            .filter_map(|result| result.ok().flatten())
            .collect()
    }

    /// Remove many documents, keeping input order and skipping the ones
    /// that could not be removed
    pub async fn remove_list<S>(&self, ids: &[S]) -> Vec<Document>
    where
        S: AsRef<str> + Sync,
    {
        let results = join_all(ids.iter().map(|id| self.remove_if_exists(id.as_ref()))).await;
        results
            .into_iter()
            .filter_map(|result| result.ok().flatten())
            .collect()
    }

    pub async fn remove_all(&self) -> StoreResult<Vec<Document>> {
        let keys = self.keys().await?;
        Ok(self.remove_list(&keys).await)
    }

    /// Up to `n` distinct documents chosen uniformly. `n == 0` asks for one.
    pub async fn random(&self, n: usize, pick: &Pick) -> StoreResult<Vec<Document>> {
        let keys = self.keys().await?;
        let wanted = n.max(1).min(keys.len());

        let chosen: Vec<&String> = {
            let mut rng = rand::thread_rng();
            keys.choose_multiple(&mut rng, wanted).collect()
        };

        Ok(self.get_list(&chosen, pick).await)
    }

    /// Full scan for documents matching `query`.
    ///
    /// Clauses on fields the schema does not declare are dropped before
    /// evaluation. Clauses see the whole stored document; `pick` applies to
    /// the matches. Results follow `keys()` order.
    pub async fn find(&self, query: &Where, logic: Logic, pick: &Pick) -> StoreResult<Vec<Document>> {
        let mut query = query.clone();
        query.retain_declared(&self.schema);

        let keys = self.keys().await?;
        let documents = self.get_list(&keys, &Pick::all()).await;

        Ok(documents
            .into_iter()
            .filter(|document| QueryEvaluator::matches(&query, logic, document))
            .map(|document| pick.apply(document))
            .collect())
    }

    // ========== File helpers ==========

    async fn file_exists(&self, path: &Path) -> StoreResult<bool> {
        self.backend
            .exists(path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }

    async fn write_document(&self, id: &str, document: &Document) -> StoreResult<()> {
        let path = self.paths.filename(id);
        let data = serde_json::to_vec_pretty(document).map_err(|e| StoreError::io(&path, e.into()))?;
        self.backend
            .write(&path, &data)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }

    /// Rename the canonical file over the backup. A missing file means a
    /// stale cache entry; it is evicted and the document reported missing.
    async fn backup(&self, id: &str) -> StoreResult<()> {
        let path = self.paths.filename(id);
        let backup = self.paths.backup_filename(id);

        match self.backend.rename(&path, &backup).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.cache.delete(&self.paths.key(id));
                warn!(
                    event = %Event::StaleCacheEvicted,
                    doc_type = %self.doc_type,
                    id = %id,
                    "cached document had no file"
                );
                Err(StoreError::NotFound { id: id.to_string() })
            }
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn loading_failed(&self, id: &str, path: PathBuf, reason: String) -> StoreError {
        warn!(
            event = %Event::DocumentLoadFailed,
            doc_type = %self.doc_type,
            id = %id,
            path = %path.display(),
            reason = %reason,
            "document file unreadable"
        );
        StoreError::LoadingFile {
            id: id.to_string(),
            path,
            reason,
        }
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("doc_type", &self.doc_type)
            .field("autoid", &self.autoid)
            .field("paths", &self.paths)
            .field("cache", &self.cache)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

fn require_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        Err(StoreError::MissingParams { param: "id" })
    } else if !StorePaths::is_valid_id(id) {
        Err(StoreError::InvalidId { id: id.to_string() })
    } else {
        Ok(())
    }
}

fn parse_document(bytes: &[u8]) -> Result<Document, String> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    Document::from_value(value).ok_or_else(|| "document is not a JSON object".to_string())
}
