//! Observability events for memodb
//!
//! Every log line emitted by the store names one of these events in its
//! `event` field. Events are explicit and typed.

use std::fmt;

/// Observable events in memodb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Type definitions loaded from disk
    SchemasLoaded,
    /// Store directory ready, store usable
    StoreOpened,

    // Document operations
    /// Document written and cached
    DocumentCreated,
    /// Document read from its file
    DocumentLoaded,
    /// Document file present but unreadable
    DocumentLoadFailed,
    /// Update committed
    DocumentUpdated,
    /// Document moved to its backup generation
    DocumentRemoved,
    /// Clone committed
    DocumentCloned,
    /// Rename committed
    DocumentRenamed,
    /// Backup generation brought back as the live document
    BackupRestored,
    /// Item dropped from a bulk result
    BulkItemSkipped,

    // Failure windows
    /// Update removed the old document but could not recreate it
    UpdateInterrupted,
    /// Rename created the new id but could not remove the old one
    RenameInterrupted,

    // Cache
    /// Cache entry dropped because its file is gone
    StaleCacheEvicted,
    /// Cache usage crossed its alert ratio
    CacheAlert,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::StoreOpened => "STORE_OPENED",

            Event::DocumentCreated => "DOCUMENT_CREATED",
            Event::DocumentLoaded => "DOCUMENT_LOADED",
            Event::DocumentLoadFailed => "DOCUMENT_LOAD_FAILED",
            Event::DocumentUpdated => "DOCUMENT_UPDATED",
            Event::DocumentRemoved => "DOCUMENT_REMOVED",
            Event::DocumentCloned => "DOCUMENT_CLONED",
            Event::DocumentRenamed => "DOCUMENT_RENAMED",
            Event::BackupRestored => "BACKUP_RESTORED",
            Event::BulkItemSkipped => "BULK_ITEM_SKIPPED",

            Event::UpdateInterrupted => "UPDATE_INTERRUPTED",
            Event::RenameInterrupted => "RENAME_INTERRUPTED",

            Event::StaleCacheEvicted => "STALE_CACHE_EVICTED",
            Event::CacheAlert => "CACHE_ALERT",
        }
    }

    /// Returns true if the event leaves the store in a state that needs
    /// manual recovery (see `DocumentStore::restore`)
    pub fn is_failure_window(&self) -> bool {
        matches!(self, Event::UpdateInterrupted | Event::RenameInterrupted)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
