use crate::{
    catalog::Schema,
    concurrency::TransactionId,
    executor::{Expression, Operator, TupleStream},
    storage::{Tuple, Value},
    Error, Result,
};

/// Emit at most `n` child tuples, where `n` comes from evaluating the
/// limit expression once against the empty tuple.
pub struct Limit {
    limit: Expression,
    child: Box<dyn Operator>,
}

impl Limit {
    pub fn new(limit: Expression, child: Box<dyn Operator>) -> Self {
        Self { limit, child }
    }
}

impl Operator for Limit {
    fn schema(&self) -> Schema {
        self.child.schema()
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        let empty = Tuple::new(Schema::empty(), vec![])?;
        let n = match self.limit.eval(&empty)? {
            Value::Int(n) if n >= 0 => n as usize,
            Value::Int(n) => {
                return Err(Error::TypeMismatch(format!(
                    "limit must not be negative, got {}",
                    n
                )))
            }
            Value::Str(s) => {
                return Err(Error::TypeMismatch(format!(
                    "limit must be an integer, got '{}'",
                    s
                )))
            }
        };

        Ok(Box::new(self.child.iterate(tx)?.take(n)))
    }
}
