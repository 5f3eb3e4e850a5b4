//! RocksDB wrapper

use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
    WriteBatch,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Column family names
pub mod cf {
    /// Accounts by address
    pub const ACCOUNTS: &str = "accounts";
    /// Storage slots by `address ‖ key`
    pub const STORAGE: &str = "storage";
    /// Contract code by hash
    pub const CODE: &str = "code";
}

/// All column family names
pub const ALL_CFS: &[&str] = &[cf::ACCOUNTS, cf::STORAGE, cf::CODE];

type RocksDB = DBWithThreadMode<MultiThreaded>;

/// Database configuration
#[derive(Clone, Debug)]
pub struct DbConfig {
    /// Create database if missing
    pub create_if_missing: bool,
    /// Maximum number of open files
    pub max_open_files: i32,
    /// Write buffer size
    pub write_buffer_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            max_open_files: 256,
            write_buffer_size: 32 * 1024 * 1024,
        }
    }
}

/// Shared handle to a RocksDB instance with the state column families
#[derive(Clone)]
pub struct Database {
    db: Arc<RwLock<Option<RocksDB>>>,
    path: PathBuf,
}

impl Database {
    /// Create a handle (not yet opened)
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            db: Arc::new(RwLock::new(None)),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Open with default config
    pub fn open(&self) -> StorageResult<()> {
        self.open_with_config(DbConfig::default())
    }

    /// Open with custom config
    pub fn open_with_config(&self, config: DbConfig) -> StorageResult<()> {
        let mut guard = self.db.write();
        if guard.is_some() {
            return Err(StorageError::AlreadyOpen);
        }

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);

        let descriptors = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));

        *guard = Some(RocksDB::open_cf_descriptors(&opts, &self.path, descriptors)?);
        debug!(path = %self.path.display(), "opened state database");
        Ok(())
    }

    /// Close the database
    pub fn close(&self) {
        *self.db.write() = None;
    }

    /// Check if database is open
    pub fn is_open(&self) -> bool {
        self.db.read().is_some()
    }

    /// Get a value from a column family
    pub fn get(&self, cf_name: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = column(db, cf_name)?;
        Ok(db.get_cf(&cf, key)?)
    }

    /// Put a value into a column family
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = column(db, cf_name)?;
        Ok(db.put_cf(&cf, key, value)?)
    }

    /// Write a batch atomically
    pub fn write_batch(&self, batch: Batch) -> StorageResult<()> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StorageError::NotOpen)?;

        let mut rocks_batch = WriteBatch::default();
        for op in batch.ops {
            match op {
                BatchOp::Put { cf_name, key, value } => {
                    rocks_batch.put_cf(&column(db, cf_name)?, key, value);
                }
                BatchOp::Delete { cf_name, key } => {
                    rocks_batch.delete_cf(&column(db, cf_name)?, key);
                }
            }
        }
        Ok(db.write(rocks_batch)?)
    }

    /// Database path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn column<'a>(db: &'a RocksDB, name: &str) -> StorageResult<Arc<BoundColumnFamily<'a>>> {
    db.cf_handle(name)
        .ok_or_else(|| StorageError::InvalidColumnFamily(name.to_string()))
}

enum BatchOp {
    Put {
        cf_name: &'static str,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf_name: &'static str,
        key: Vec<u8>,
    },
}

/// Pending writes applied together by [`Database::write_batch`]
#[derive(Default)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put
    pub fn put(&mut self, cf_name: &'static str, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            cf_name,
            key: key.into(),
            value: value.into(),
        });
    }

    /// Queue a delete
    pub fn delete(&mut self, cf_name: &'static str, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete {
            cf_name,
            key: key.into(),
        });
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path());
        db.open().unwrap();
        (dir, db)
    }

    #[test]
    fn test_open_close() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path());
        assert!(!db.is_open());
        db.open().unwrap();
        assert!(db.is_open());
        assert!(matches!(db.open(), Err(StorageError::AlreadyOpen)));
        db.close();
        assert!(!db.is_open());
        assert_eq!(db.path(), dir.path());
    }

    #[test]
    fn test_not_open_error() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path());
        assert!(matches!(db.get(cf::ACCOUNTS, b"k"), Err(StorageError::NotOpen)));
        assert!(matches!(db.put(cf::ACCOUNTS, b"k", b"v"), Err(StorageError::NotOpen)));
        assert!(matches!(db.write_batch(Batch::new()), Err(StorageError::NotOpen)));
    }

    #[test]
    fn test_put_get() {
        let (_dir, db) = open_temp();
        db.put(cf::ACCOUNTS, b"key1", b"value1").unwrap();
        assert_eq!(db.get(cf::ACCOUNTS, b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(db.get(cf::ACCOUNTS, b"missing").unwrap(), None);
    }

    #[test]
    fn test_column_family_isolation() {
        let (_dir, db) = open_temp();
        db.put(cf::CODE, b"same", b"code").unwrap();
        assert!(db.get(cf::STORAGE, b"same").unwrap().is_none());
        assert!(matches!(
            db.get("receipts", b"same"),
            Err(StorageError::InvalidColumnFamily(_))
        ));
    }

    #[test]
    fn test_write_batch() {
        let (_dir, db) = open_temp();
        db.put(cf::STORAGE, b"old", b"x").unwrap();

        let mut batch = Batch::new();
        batch.put(cf::ACCOUNTS, b"acc1".to_vec(), b"data1".to_vec());
        batch.put(cf::STORAGE, b"slot".to_vec(), b"val".to_vec());
        batch.delete(cf::STORAGE, b"old".to_vec());
        assert_eq!(batch.len(), 3);
        db.write_batch(batch).unwrap();

        assert_eq!(db.get(cf::ACCOUNTS, b"acc1").unwrap(), Some(b"data1".to_vec()));
        assert_eq!(db.get(cf::STORAGE, b"slot").unwrap(), Some(b"val".to_vec()));
        assert!(db.get(cf::STORAGE, b"old").unwrap().is_none());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let db = Database::new(dir.path());
            db.open().unwrap();
            db.put(cf::CODE, b"hash", b"code").unwrap();
            db.close();
        }
        let db = Database::new(dir.path());
        db.open().unwrap();
        assert_eq!(db.get(cf::CODE, b"hash").unwrap(), Some(b"code".to_vec()));
    }

    #[test]
    fn test_clone_shares_handle() {
        let (_dir, db) = open_temp();
        let other = db.clone();
        other.put(cf::ACCOUNTS, b"k", b"v").unwrap();
        assert!(db.get(cf::ACCOUNTS, b"k").unwrap().is_some());
        other.close();
        assert!(!db.is_open());
    }
}
