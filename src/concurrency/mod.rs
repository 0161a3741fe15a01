mod transaction;

pub use self::transaction::{AccessKind, TransactionId, TransactionPhase};
