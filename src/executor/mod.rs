mod aggregate;
mod delete;
mod expression;
mod filter;
mod insert;
mod limit;
mod order_by;
mod project;
mod scan;

pub use self::{
    aggregate::{
        Aggregate, AggState, AvgState, CountState, MaxState, MinState, SumState,
    },
    delete::Delete,
    expression::{Expression, Predicate},
    filter::Filter,
    insert::Insert,
    limit::Limit,
    order_by::OrderBy,
    project::Project,
    scan::SeqScan,
};

use crate::{catalog::Schema, concurrency::TransactionId, storage::Tuple, Result};

/// A lazy, finite stream of tuples.
pub type TupleStream<'a> = Box<dyn Iterator<Item = Result<Tuple>> + 'a>;

/// A node of a query plan. Plans are trees of operators built bottom-up;
/// iteration pulls tuples from the leaves towards the root, one at a time.
pub trait Operator {
    /// The schema of the tuples this operator emits.
    fn schema(&self) -> Schema;

    /// Start pulling tuples on behalf of the transaction.
    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>>;
}
