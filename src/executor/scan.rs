use crate::{
    catalog::Schema,
    concurrency::TransactionId,
    executor::{Operator, TupleStream},
    storage::TablePtr,
    Result,
};

/// Leaf operator: the sequential scan of a heap file.
pub struct SeqScan {
    file: TablePtr,
}

impl SeqScan {
    pub fn new(file: TablePtr) -> Self {
        Self { file }
    }
}

impl Operator for SeqScan {
    fn schema(&self) -> Schema {
        self.file.schema().clone()
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        Ok(Box::new(self.file.scan(tx)))
    }
}
