use crate::{
    catalog::{Column, DataType, Schema},
    concurrency::TransactionId,
    executor::{Operator, TupleStream},
    storage::{TablePtr, Tuple, Value},
    Result,
};

/// Drain the child into the heap file and emit a single `(count)` tuple.
pub struct Insert {
    file: TablePtr,
    child: Box<dyn Operator>,
}

impl Insert {
    pub fn new(file: TablePtr, child: Box<dyn Operator>) -> Self {
        Self { file, child }
    }
}

impl Operator for Insert {
    fn schema(&self) -> Schema {
        Schema::new(vec![Column::new("count", DataType::Int)])
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        Ok(Box::new(InsertStream {
            op: self,
            tx,
            done: false,
        }))
    }
}

struct InsertStream<'a> {
    op: &'a Insert,
    tx: TransactionId,
    done: bool,
}

impl<'a> Iterator for InsertStream<'a> {
    type Item = Result<Tuple>;

    // the child is drained on the first pull; afterwards the stream is done
    fn next(&mut self) -> Option<Result<Tuple>> {
        if self.done {
            return None;
        }
        self.done = true;

        let child = match self.op.child.iterate(self.tx) {
            Ok(child) => child,
            Err(e) => return Some(Err(e)),
        };

        let mut count = 0i64;
        for item in child {
            let insert = item.and_then(|tuple| self.op.file.insert_tuple(tuple, self.tx));
            match insert {
                Ok(_) => count += 1,
                Err(e) => return Some(Err(e)),
            }
        }

        Some(Tuple::new(self.op.schema(), vec![Value::Int(count)]))
    }
}
