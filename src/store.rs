use crate::{id::Id, state::State, transaction::Transaction};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    fs,
    io::{self, ErrorKind},
    path::PathBuf,
};
use thiserror::Error;

/// Resolves an identifier to the transaction stored under it.
pub trait Loader {
    fn load(&self, id: &Id) -> Result<Transaction, LoadError>;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Transaction not found: {0}")]
    NotFound(Id),

    #[error("Failed to read transaction: {0}")]
    Io(#[from] io::Error),

    #[error("Transaction is not valid: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Transaction stored as {expected} hashes to {actual}")]
    Mismatch { expected: Id, actual: Id },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access ledger: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode transaction: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Ledger head is not a valid id: {0}")]
    InvalidHead(#[from] crate::id::IdError),
}

/// Ledger laid out on disk as `objects/<id>` JSON records plus a `refs/HEAD` pointer.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, id: &Id) -> PathBuf {
        self.root.join("objects").join(id.to_string())
    }

    fn head_path(&self) -> PathBuf {
        self.root.join("refs").join("HEAD")
    }

    /// Current head, `Id::ROOT` when nothing has been recorded yet.
    pub fn head(&self) -> Result<Id, StoreError> {
        match fs::read_to_string(self.head_path()) {
            Ok(contents) => Ok(contents.parse()?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Id::ROOT),
            Err(err) => Err(err.into()),
        }
    }

    pub fn set_head(&self, id: Id) -> Result<(), StoreError> {
        let path = self.head_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("{}\n", id))?;
        Ok(())
    }

    pub fn write(&self, transaction: &Transaction) -> Result<Id, StoreError> {
        let id = transaction.id();
        let path = self.object_path(&id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, transaction.to_vec()?)?;
        Ok(id)
    }

    /// Records a new snapshot on top of the current head and moves the head to it.
    pub fn append(
        &self,
        state: State,
        time: DateTime<Utc>,
        comment: &str,
    ) -> Result<Id, StoreError> {
        let transaction = Transaction::new(self.head()?, time, state, comment)?;
        let id = self.write(&transaction)?;
        self.set_head(id)?;
        Ok(id)
    }
}

impl Loader for FileSystemStore {
    fn load(&self, id: &Id) -> Result<Transaction, LoadError> {
        let bytes = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(LoadError::NotFound(*id)),
            Err(err) => return Err(err.into()),
        };

        let transaction = Transaction::from_slice(&bytes)?;
        if transaction.id() != *id {
            return Err(LoadError::Mismatch {
                expected: *id,
                actual: transaction.id(),
            });
        }

        Ok(transaction)
    }
}

/// In-process ledger, used where nothing needs to outlive the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub objects: HashMap<Id, Transaction>,
    pub head: Id,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        state: State,
        time: DateTime<Utc>,
        comment: &str,
    ) -> Result<Id, StoreError> {
        let transaction = Transaction::new(self.head, time, state, comment)?;
        let id = transaction.id();
        self.objects.insert(id, transaction);
        self.head = id;
        Ok(id)
    }
}

impl Loader for MemoryStore {
    fn load(&self, id: &Id) -> Result<Transaction, LoadError> {
        self.objects
            .get(id)
            .cloned()
            .ok_or(LoadError::NotFound(*id))
    }
}
