use crate::{
    catalog::{Column, DataType, Schema},
    concurrency::TransactionId,
    executor::{Operator, TupleStream},
    storage::{TablePtr, Tuple, Value},
    Result,
};

/// Delete every child tuple from the heap file (by rid) and emit a single
/// `(count)` tuple.
pub struct Delete {
    file: TablePtr,
    child: Box<dyn Operator>,
}

impl Delete {
    pub fn new(file: TablePtr, child: Box<dyn Operator>) -> Self {
        Self { file, child }
    }
}

impl Operator for Delete {
    fn schema(&self) -> Schema {
        Schema::new(vec![Column::new("count", DataType::Int)])
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        Ok(Box::new(DeleteStream {
            op: self,
            tx,
            done: false,
        }))
    }
}

struct DeleteStream<'a> {
    op: &'a Delete,
    tx: TransactionId,
    done: bool,
}

impl<'a> Iterator for DeleteStream<'a> {
    type Item = Result<Tuple>;

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
            let delete = item.and_then(|tuple| self.op.file.delete_tuple(&tuple, self.tx));
            match delete {
                Ok(()) => count += 1,
                Err(e) => return Some(Err(e)),
            }
        }

        Some(Tuple::new(self.op.schema(), vec![Value::Int(count)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::DataType as Dt,
        executor::{Expression, Filter, Predicate, SeqScan},
        test_util::get_temp_table,
    };

    #[test]
    fn delete_removes_the_filtered_tuples() {
        let (file, pool, _dir) = get_temp_table(8);
        file.load_rows(
            (0..6)
                .map(|a| vec![a.to_string(), "s".to_string()])
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let doomed = Filter::new(
            Expression::column("a", Dt::Int),
            Predicate::Lt,
            Expression::literal(Value::Int(3)),
            Box::new(SeqScan::new(file.clone())),
        );
        let plan = Delete::new(file.clone(), Box::new(doomed));

        let counted = plan.iterate(tx).unwrap().next().unwrap().unwrap();
        assert_eq!(counted.value(0), Some(&Value::Int(3)));

        pool.commit(tx).unwrap();

        let tx = TransactionId::new();
        pool.begin(tx).unwrap();
        assert_eq!(file.scan(tx).count(), 3);
    }
}
