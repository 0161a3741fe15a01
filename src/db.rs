use fs2::FileExt;

use crate::{
    catalog::{CatalogCache, Schema},
    concurrency::TransactionId,
    storage::{BufferPool, HeapFile, TablePtr},
    DBConfig, Result,
};

use std::{
    fs::{DirBuilder, File, OpenOptions},
    sync::Arc,
};

/// The embedded database: one per process.
///
/// The facade owns the buffer pool every table shares and a non-persistent
/// registry of the tables the host has opened. An exclusive lock on the
/// root directory's `LOCK` file keeps a second process (or a second `DB`)
/// away from the same files.
pub struct DB {
    config: DBConfig,
    buffer_pool: Arc<BufferPool>,
    catalog: CatalogCache,
    // holds the fs2 exclusive lock for as long as the database is open
    _lock_file: File,
}

impl DB {
    pub fn new(config: DBConfig) -> Result<Self> {
        if !config.root_path.is_dir() {
            DirBuilder::new().recursive(true).create(&config.root_path)?;
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(config.get_lock_path())?;
        lock_file.try_lock_exclusive()?;

        let buffer_pool = Arc::new(BufferPool::new(config.cache_capacity));

        Ok(Self {
            config,
            buffer_pool,
            catalog: CatalogCache::new(),
            _lock_file: lock_file,
        })
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// Open (or create) the heap file backing `name` under the database
    /// root and register it.
    pub fn create_table(&self, name: &str, schema: Schema) -> Result<TablePtr> {
        let table = HeapFile::open(
            self.config.get_table_path(name),
            schema,
            self.buffer_pool.clone(),
        )?;
        self.catalog.add_table(name, table.clone());
        Ok(table)
    }

    pub fn lookup_table(&self, name: &str) -> Option<TablePtr> {
        self.catalog.lookup_table(name)
    }

    pub fn start_transaction(&self) -> Result<TransactionId> {
        let tx = TransactionId::new();
        self.buffer_pool.begin(tx)?;
        Ok(tx)
    }

    pub fn commit_transaction(&self, tx: TransactionId) -> Result<()> {
        self.buffer_pool.commit(tx)
    }

    pub fn abort_transaction(&self, tx: TransactionId) -> Result<()> {
        self.buffer_pool.abort(tx)
    }
}
