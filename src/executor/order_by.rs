use crate::{
    catalog::Schema,
    concurrency::TransactionId,
    executor::{Expression, Operator, TupleStream},
    storage::{Tuple, Value},
    Error, Result,
};

use std::cmp::Ordering;

/// Emit the child's tuples sorted by the order-by expressions. Blocking:
/// the whole child output is buffered and sorted up front.
pub struct OrderBy {
    exprs: Vec<Expression>,
    ascending: Vec<bool>,
    child: Box<dyn Operator>,
}

impl OrderBy {
    pub fn new(
        exprs: Vec<Expression>,
        ascending: Vec<bool>,
        child: Box<dyn Operator>,
    ) -> Result<Self> {
        if exprs.len() != ascending.len() {
            return Err(Error::MalformedData(format!(
                "{} order-by expressions but {} directions",
                exprs.len(),
                ascending.len()
            )));
        }

        Ok(Self {
            exprs,
            ascending,
            child,
        })
    }
}

impl Operator for OrderBy {
    fn schema(&self) -> Schema {
        self.child.schema()
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        // evaluate the sort keys once per tuple before sorting, so the
        // comparator itself cannot fail
        let mut keyed: Vec<(Vec<Value>, Tuple)> = Vec::new();
        for item in self.child.iterate(tx)? {
            let tuple = item?;
            let mut keys = Vec::with_capacity(self.exprs.len());
            for expr in &self.exprs {
                keys.push(expr.eval(&tuple)?);
            }
            keyed.push((keys, tuple));
        }

        // stable sort, so equal keys keep their input order
        keyed.sort_by(|(a, _), (b, _)| {
            for (k, ascending) in self.ascending.iter().enumerate() {
                // keys of one expression share a variant; a mismatch is
                // impossible after eval checked them
                let ord = a[k].compare(&b[k]).unwrap_or(Ordering::Equal);
                if ord != Ordering::Equal {
                    return if *ascending { ord } else { ord.reverse() };
                }
            }
            Ordering::Equal
        });

        Ok(Box::new(keyed.into_iter().map(|(_, tuple)| Ok(tuple))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::DataType,
        executor::SeqScan,
        test_util::get_temp_table,
    };

    fn number_table() -> (
        crate::storage::TablePtr,
        std::sync::Arc<crate::storage::BufferPool>,
        tempfile::TempDir,
    ) {
        let (file, pool, dir) = get_temp_table(8);
        file.load_rows(
            [3, 1, 4, 1, 5]
                .iter()
                .map(|a| vec![a.to_string(), format!("s{}", a)])
                .collect::<Vec<_>>(),
        )
        .unwrap();
        (file, pool, dir)
    }

    fn first_ints(plan: &dyn Operator, tx: TransactionId) -> Vec<i64> {
        plan.iterate(tx)
            .unwrap()
            .map(|t| match t.unwrap().value(0).unwrap() {
                Value::Int(v) => *v,
                other => panic!("unexpected value {}", other),
            })
            .collect()
    }

    #[test]
    fn sorts_ascending_and_descending() {
        let (file, pool, _dir) = number_table();
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let asc = OrderBy::new(
            vec![Expression::column("a", DataType::Int)],
            vec![true],
            Box::new(SeqScan::new(file.clone())),
        )
        .unwrap();
        assert_eq!(first_ints(&asc, tx), vec![1, 1, 3, 4, 5]);

        let desc = OrderBy::new(
            vec![Expression::column("a", DataType::Int)],
            vec![false],
            Box::new(SeqScan::new(file.clone())),
        )
        .unwrap();
        assert_eq!(first_ints(&desc, tx), vec![5, 4, 3, 1, 1]);
    }

    #[test]
    fn identical_runs_emit_identical_orders() {
        let (file, pool, _dir) = number_table();
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let plan = OrderBy::new(
            vec![Expression::column("a", DataType::Int)],
            vec![true],
            Box::new(SeqScan::new(file.clone())),
        )
        .unwrap();

        let first: Vec<Tuple> = plan.iterate(tx).unwrap().map(|t| t.unwrap()).collect();
        let second: Vec<Tuple> = plan.iterate(tx).unwrap().map(|t| t.unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn secondary_keys_break_ties() {
        let (file, pool, _dir) = get_temp_table(8);
        file.load_rows(vec![
            vec!["1".to_string(), "b".to_string()],
            vec!["1".to_string(), "a".to_string()],
            vec!["0".to_string(), "c".to_string()],
        ])
        .unwrap();

        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let plan = OrderBy::new(
            vec![
                Expression::column("a", DataType::Int),
                Expression::column("b", DataType::Str),
            ],
            vec![true, true],
            Box::new(SeqScan::new(file.clone())),
        )
        .unwrap();

        let rows: Vec<(i64, String)> = plan
            .iterate(tx)
            .unwrap()
            .map(|t| {
                let t = t.unwrap();
                match (t.value(0).unwrap(), t.value(1).unwrap()) {
                    (Value::Int(a), Value::Str(b)) => (*a, b.clone()),
                    _ => panic!("unexpected tuple {}", t),
                }
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, "c".to_string()),
                (1, "a".to_string()),
                (1, "b".to_string()),
            ]
        );
    }
}
