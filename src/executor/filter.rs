use crate::{
    catalog::Schema,
    concurrency::TransactionId,
    executor::{Expression, Operator, Predicate, TupleStream},
    storage::Tuple,
    Result,
};

/// Emit the child's tuples for which `left predicate right` holds.
pub struct Filter {
    left: Expression,
    predicate: Predicate,
    right: Expression,
    child: Box<dyn Operator>,
}

impl Filter {
    pub fn new(
        left: Expression,
        predicate: Predicate,
        right: Expression,
        child: Box<dyn Operator>,
    ) -> Self {
        Self {
            left,
            predicate,
            right,
            child,
        }
    }

    fn matches(&self, tuple: &Tuple) -> Result<bool> {
        let left = self.left.eval(tuple)?;
        let right = self.right.eval(tuple)?;
        self.predicate.eval(&left, &right)
    }
}

impl Operator for Filter {
    fn schema(&self) -> Schema {
        self.child.schema()
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        let stream = self.child.iterate(tx)?;

        Ok(Box::new(stream.filter_map(move |item| match item {
            Ok(tuple) => match self.matches(&tuple) {
                Ok(true) => Some(Ok(tuple)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            },
            Err(e) => Some(Err(e)),
        })))
    }
}
