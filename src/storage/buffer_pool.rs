use log::{debug, info};
use lru::LruCache;

use crate::{
    concurrency::{AccessKind, TransactionId, TransactionPhase},
    storage::{heap_file, HeapFile, HeapPage, PageKey},
    Error, Result,
};

use std::{
    collections::HashMap,
    sync::Mutex,
};

/// Everything a running transaction has accumulated: its private page
/// copies, the keys it touched with read and write intent (duplicates are
/// fine, membership is what matters), and the accesses other transactions
/// published at us when they committed.
struct TxState {
    phase: TransactionPhase,
    pages: HashMap<PageKey, HeapPage>,
    read_set: Vec<PageKey>,
    write_set: Vec<PageKey>,
    access_record: HashMap<TransactionId, HashMap<PageKey, AccessKind>>,
}

impl TxState {
    fn new() -> Self {
        Self {
            phase: TransactionPhase::Read,
            pages: HashMap::new(),
            read_set: Vec::new(),
            write_set: Vec::new(),
            access_record: HashMap::new(),
        }
    }
}

struct PoolState {
    capacity: usize,
    /// Authoritative cache of committed pages, bounded by `capacity`.
    committed: HashMap<PageKey, HeapPage>,
    /// Recency order over `committed`'s keys, kept strictly in sync with
    /// it: every committed insert puts here, every committed remove pops.
    recency: LruCache<PageKey, ()>,
    transactions: HashMap<TransactionId, TxState>,
}

/// Bounded cache of committed pages plus the sandbox of per-transaction
/// page copies, coordinated with optimistic concurrency control.
///
/// Transactions never see each other's in-flight changes: the first access
/// deep-copies the committed page into the transaction's private map, and
/// commit validates the transaction's read and write sets against the
/// writes concurrent committers published before installing and flushing
/// its pages (FORCE). Dirty pages of uncommitted transactions never reach
/// disk (NO-STEAL).
///
/// One mutex guards the whole pool state; disk reads and commit-time
/// flushes happen while holding it.
pub struct BufferPool {
    state: Mutex<PoolState>,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        BufferPool {
            state: Mutex::new(PoolState {
                capacity,
                committed: HashMap::new(),
                recency: LruCache::new(capacity),
                transactions: HashMap::new(),
            }),
        }
    }

    /// The phase the transaction is currently in, or `None` if it is not
    /// running.
    pub fn transaction_phase(&self, tx: TransactionId) -> Option<TransactionPhase> {
        let guard = self.state.lock().unwrap();
        guard.transactions.get(&tx).map(|txstate| txstate.phase)
    }

    /// Start a transaction in its read phase.
    pub fn begin(&self, tx: TransactionId) -> Result<()> {
        let mut guard = self.state.lock().unwrap();

        if guard.transactions.contains_key(&tx) {
            return Err(Error::TxAlreadyRunning(tx));
        }
        guard.transactions.insert(tx, TxState::new());
        Ok(())
    }

    /// Run `f` against the transaction's private copy of the page,
    /// recording the access with read intent.
    pub fn with_page_read<F, R>(
        &self,
        file: &HeapFile,
        page_no: usize,
        tx: TransactionId,
        f: F,
    ) -> Result<R>
    where
        F: FnOnce(&HeapPage) -> Result<R>,
    {
        self.with_page(file, page_no, tx, AccessKind::Read, |page| f(page))
    }

    /// Run `f` against the transaction's private copy of the page,
    /// recording the access with write intent.
    pub fn with_page_write<F, R>(
        &self,
        file: &HeapFile,
        page_no: usize,
        tx: TransactionId,
        f: F,
    ) -> Result<R>
    where
        F: FnOnce(&mut HeapPage) -> Result<R>,
    {
        self.with_page(file, page_no, tx, AccessKind::Write, f)
    }

    fn with_page<F, R>(
        &self,
        file: &HeapFile,
        page_no: usize,
        tx: TransactionId,
        kind: AccessKind,
        f: F,
    ) -> Result<R>
    where
        F: FnOnce(&mut HeapPage) -> Result<R>,
    {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let key = file.page_key(page_no);

        let has_copy = match state.transactions.get(&tx) {
            Some(txstate) => txstate.pages.contains_key(&key),
            None => return Err(Self::unknown_tx(tx)),
        };

        if !has_copy {
            let page = match state.committed.get(&key).cloned() {
                Some(page) => page,
                None => {
                    Self::make_room(state)?;
                    let page = file.read_page(page_no)?;
                    state.committed.insert(key.clone(), page.clone());
                    page
                }
            };
            state.recency.put(key.clone(), ());

            // the clone above is the deep copy: it shares no mutable
            // state with the committed version
            let txstate = state
                .transactions
                .get_mut(&tx)
                .ok_or_else(|| Self::unknown_tx(tx))?;
            txstate.pages.insert(key.clone(), page);
        }

        let txstate = state
            .transactions
            .get_mut(&tx)
            .ok_or_else(|| Self::unknown_tx(tx))?;
        match kind {
            AccessKind::Read => txstate.read_set.push(key.clone()),
            AccessKind::Write => txstate.write_set.push(key.clone()),
        }

        let page = txstate
            .pages
            .get_mut(&key)
            .ok_or_else(|| Error::NotFound(format!("no page copy for {}", key)))?;
        f(page)
    }

    /// Validate the transaction against the accesses concurrent committers
    /// published, then install and flush its pages. A conflicting write by
    /// a concurrent transaction aborts this one.
    pub fn commit(&self, tx: TransactionId) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        {
            let txstate = state
                .transactions
                .get_mut(&tx)
                .ok_or_else(|| Self::unknown_tx(tx))?;
            txstate.phase = TransactionPhase::Validation;

            let conflict = txstate.access_record.iter().find_map(|(other, entries)| {
                entries
                    .iter()
                    .find(|(key, kind)| {
                        **kind == AccessKind::Write
                            && (txstate.read_set.contains(*key) || txstate.write_set.contains(*key))
                    })
                    .map(|(key, _)| (*other, key.clone()))
            });

            if let Some((other, key)) = conflict {
                info!(
                    "transaction {} failed validation: transaction {} wrote page {}",
                    tx, other, key
                );
                Self::abort_tx(state, tx);
                return Err(Error::TxAborted(tx));
            }
        }

        let mut txstate = match state.transactions.remove(&tx) {
            Some(txstate) => txstate,
            None => return Err(Self::unknown_tx(tx)),
        };
        txstate.phase = TransactionPhase::Write;

        for (key, mut page) in txstate.pages.drain() {
            if page.is_dirty() {
                heap_file::write_page_at(key.path(), &page)?;
                page.set_dirty(false);
            }
            if !state.committed.contains_key(&key) {
                Self::make_room(state)?;
            }
            state.committed.insert(key.clone(), page);
            state.recency.put(key, ());
        }

        // publish our accesses to every transaction still running; a write
        // overrides a read on the same key
        for other in state.transactions.values_mut() {
            let record = other.access_record.entry(tx).or_insert_with(HashMap::new);
            for key in &txstate.read_set {
                record.insert(key.clone(), AccessKind::Read);
            }
            for key in &txstate.write_set {
                record.insert(key.clone(), AccessKind::Write);
            }
        }

        debug!("transaction {} committed", tx);
        Ok(())
    }

    /// Throw away the transaction's copies and access records.
    pub fn abort(&self, tx: TransactionId) -> Result<()> {
        let mut guard = self.state.lock().unwrap();

        if !guard.transactions.contains_key(&tx) {
            return Err(Self::unknown_tx(tx));
        }
        Self::abort_tx(&mut guard, tx);
        Ok(())
    }

    /// Flush every dirty committed page and drop the whole cache.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        for (key, page) in state.committed.iter_mut() {
            if page.is_dirty() {
                heap_file::write_page_at(key.path(), page)?;
                page.set_dirty(false);
            }
        }
        state.committed.clear();
        state.recency = LruCache::new(state.capacity);
        Ok(())
    }

    /// Put a freshly appended page into the committed cache. The caller
    /// has already written the page image to disk, so the cache entry and
    /// the file agree.
    pub(crate) fn install_page(&self, key: PageKey, page: HeapPage) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        if !state.committed.contains_key(&key) {
            Self::make_room(state)?;
        }
        state.committed.insert(key.clone(), page);
        state.recency.put(key, ());
        Ok(())
    }

    fn abort_tx(state: &mut PoolState, tx: TransactionId) {
        for other in state.transactions.values_mut() {
            other.access_record.remove(&tx);
        }

        if let Some(txstate) = state.transactions.remove(&tx) {
            // under the deep-copy discipline the committed versions are
            // untouched, but dropping them forces a reload on next access
            // in case a copy was ever shared
            for key in &txstate.write_set {
                state.committed.remove(key);
                state.recency.pop(key);
            }
        }
        debug!("transaction {} aborted", tx);
    }

    /// Evict clean committed pages, least recently used first, until there
    /// is room for one more.
    fn make_room(state: &mut PoolState) -> Result<()> {
        while state.committed.len() >= state.capacity {
            let mut victim = None;
            let mut dirty_keys = Vec::new();

            while let Some((key, ())) = state.recency.pop_lru() {
                let is_dirty = state
                    .committed
                    .get(&key)
                    .map(|page| page.is_dirty())
                    .unwrap_or(false);
                if is_dirty {
                    dirty_keys.push(key);
                } else {
                    victim = Some(key);
                    break;
                }
            }
            for key in dirty_keys {
                state.recency.put(key, ());
            }

            match victim {
                Some(key) => {
                    state.committed.remove(&key);
                    debug!("evicted page {} from the committed cache", key);
                }
                None => return Err(Error::BufferFull),
            }
        }
        Ok(())
    }

    fn unknown_tx(tx: TransactionId) -> Error {
        Error::NotFound(format!("transaction {} is not running", tx))
    }
}
