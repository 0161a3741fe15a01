use std::{
    fmt::{self, Display},
    sync::atomic::{AtomicU64, Ordering},
};

/// Identifier of a transaction. Fresh ids come from a process-global
/// counter; the buffer pool tracks which ids are live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(NEXT_TX_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        TransactionId::new()
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The intent a transaction declared when it requested a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

/// Lifecycle phase of an optimistic transaction. Transactions spend their
/// lives in `Read`; `Validation` and `Write` exist only inside commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Read,
    Validation,
    Write,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
