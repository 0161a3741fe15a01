use crate::{
    catalog::{Column, DataType, Schema},
    concurrency::TransactionId,
    executor::{Expression, Operator, TupleStream},
    storage::{Tuple, Value},
    Error, Result,
};

use std::collections::{hash_map::Entry, HashMap};

/// One aggregation function being folded over a group of tuples.
///
/// The pre-iteration `schema` of the sum, min and max states reports `Int`
/// whatever the inputs turn out to be; their `finalize` builds its output
/// column from the variant the accumulator actually holds. Callers that
/// aggregate strings should take the finalized tuple's schema, not the
/// state's.
pub trait AggState {
    /// A fresh state with the same alias and expression, ready for a new
    /// group.
    fn boxed_clone(&self) -> Box<dyn AggState>;

    /// Fold one tuple into the accumulator.
    fn add(&mut self, tuple: &Tuple) -> Result<()>;

    /// The accumulated result as a one-field tuple.
    fn finalize(&self) -> Result<Tuple>;

    /// The column this state claims to produce.
    fn schema(&self) -> Schema;
}

fn int_column_schema(alias: &str) -> Schema {
    Schema::new(vec![Column::new(alias, DataType::Int)])
}

fn one_value_tuple(alias: &str, value: Value) -> Result<Tuple> {
    let schema = Schema::new(vec![Column::new(alias, value.data_type())]);
    Tuple::new(schema, vec![value])
}

/// COUNT: how many tuples the group holds, whatever their values.
pub struct CountState {
    alias: String,
    expr: Expression,
    count: i64,
}

impl CountState {
    pub fn new(alias: &str, expr: Expression) -> Self {
        Self {
            alias: alias.to_string(),
            expr,
            count: 0,
        }
    }
}

impl AggState for CountState {
    fn boxed_clone(&self) -> Box<dyn AggState> {
        Box::new(CountState::new(&self.alias, self.expr.clone()))
    }

    fn add(&mut self, tuple: &Tuple) -> Result<()> {
        self.expr.eval(tuple)?;
        self.count += 1;
        Ok(())
    }

    fn finalize(&self) -> Result<Tuple> {
        one_value_tuple(&self.alias, Value::Int(self.count))
    }

    fn schema(&self) -> Schema {
        int_column_schema(&self.alias)
    }
}

/// SUM: numeric addition for integers, concatenation for strings. The
/// accumulator adopts the neutral element of the first value it sees.
pub struct SumState {
    alias: String,
    expr: Expression,
    sum: Option<Value>,
}

impl SumState {
    pub fn new(alias: &str, expr: Expression) -> Self {
        Self {
            alias: alias.to_string(),
            expr,
            sum: None,
        }
    }
}

impl AggState for SumState {
    fn boxed_clone(&self) -> Box<dyn AggState> {
        Box::new(SumState::new(&self.alias, self.expr.clone()))
    }

    fn add(&mut self, tuple: &Tuple) -> Result<()> {
        let value = self.expr.eval(tuple)?;
        let sum = self.sum.get_or_insert_with(|| match value.data_type() {
            DataType::Int => Value::Int(0),
            DataType::Str => Value::Str(String::new()),
        });

        match (sum, value) {
            (Value::Int(acc), Value::Int(v)) => *acc += v,
            (Value::Str(acc), Value::Str(v)) => acc.push_str(&v),
            (_, value) => {
                return Err(Error::TypeMismatch(format!(
                    "cannot fold '{}' into a sum of the other variant",
                    value
                )))
            }
        }
        Ok(())
    }

    fn finalize(&self) -> Result<Tuple> {
        let value = self.sum.clone().unwrap_or(Value::Int(0));
        one_value_tuple(&self.alias, value)
    }

    fn schema(&self) -> Schema {
        int_column_schema(&self.alias)
    }
}

/// AVG over integers, with integer division. The contract assumes at least
/// one `add` before `finalize`; an empty average comes out as zero.
pub struct AvgState {
    alias: String,
    expr: Expression,
    total: i64,
    count: i64,
}

impl AvgState {
    pub fn new(alias: &str, expr: Expression) -> Self {
        Self {
            alias: alias.to_string(),
            expr,
            total: 0,
            count: 0,
        }
    }
}

impl AggState for AvgState {
    fn boxed_clone(&self) -> Box<dyn AggState> {
        Box::new(AvgState::new(&self.alias, self.expr.clone()))
    }

    fn add(&mut self, tuple: &Tuple) -> Result<()> {
        match self.expr.eval(tuple)? {
            Value::Int(v) => {
                self.total += v;
                self.count += 1;
                Ok(())
            }
            Value::Str(s) => Err(Error::TypeMismatch(format!(
                "cannot average string value '{}'",
                s
            ))),
        }
    }

    fn finalize(&self) -> Result<Tuple> {
        let avg = if self.count == 0 {
            0
        } else {
            self.total / self.count
        };
        one_value_tuple(&self.alias, Value::Int(avg))
    }

    fn schema(&self) -> Schema {
        int_column_schema(&self.alias)
    }
}

/// MIN under the natural orderings; the first value seeds the accumulator.
pub struct MinState {
    alias: String,
    expr: Expression,
    min: Option<Value>,
}

impl MinState {
    pub fn new(alias: &str, expr: Expression) -> Self {
        Self {
            alias: alias.to_string(),
            expr,
            min: None,
        }
    }
}

impl AggState for MinState {
    fn boxed_clone(&self) -> Box<dyn AggState> {
        Box::new(MinState::new(&self.alias, self.expr.clone()))
    }

    fn add(&mut self, tuple: &Tuple) -> Result<()> {
        let value = self.expr.eval(tuple)?;
        match &self.min {
            None => self.min = Some(value),
            Some(current) => {
                if value.compare(current)? == std::cmp::Ordering::Less {
                    self.min = Some(value);
                }
            }
        }
        Ok(())
    }

    fn finalize(&self) -> Result<Tuple> {
        let value = self.min.clone().unwrap_or(Value::Int(0));
        one_value_tuple(&self.alias, value)
    }

    fn schema(&self) -> Schema {
        int_column_schema(&self.alias)
    }
}

/// MAX under the natural orderings; the first value seeds the accumulator.
pub struct MaxState {
    alias: String,
    expr: Expression,
    max: Option<Value>,
}

impl MaxState {
    pub fn new(alias: &str, expr: Expression) -> Self {
        Self {
            alias: alias.to_string(),
            expr,
            max: None,
        }
    }
}

impl AggState for MaxState {
    fn boxed_clone(&self) -> Box<dyn AggState> {
        Box::new(MaxState::new(&self.alias, self.expr.clone()))
    }

    fn add(&mut self, tuple: &Tuple) -> Result<()> {
        let value = self.expr.eval(tuple)?;
        match &self.max {
            None => self.max = Some(value),
            Some(current) => {
                if value.compare(current)? == std::cmp::Ordering::Greater {
                    self.max = Some(value);
                }
            }
        }
        Ok(())
    }

    fn finalize(&self) -> Result<Tuple> {
        let value = self.max.clone().unwrap_or(Value::Int(0));
        one_value_tuple(&self.alias, value)
    }

    fn schema(&self) -> Schema {
        int_column_schema(&self.alias)
    }
}

/// Group the child's tuples by the group expressions and fold each group
/// through clones of the supplied aggregate states. Groups are emitted in
/// the order they were first encountered.
pub struct Aggregate {
    group_exprs: Vec<Expression>,
    states: Vec<Box<dyn AggState>>,
    child: Box<dyn Operator>,
}

impl Aggregate {
    pub fn new(
        group_exprs: Vec<Expression>,
        states: Vec<Box<dyn AggState>>,
        child: Box<dyn Operator>,
    ) -> Self {
        Self {
            group_exprs,
            states,
            child,
        }
    }

    fn group_schema(&self) -> Schema {
        Schema::new(
            self.group_exprs
                .iter()
                .map(|expr| expr.output_column())
                .collect(),
        )
    }
}

impl Operator for Aggregate {
    fn schema(&self) -> Schema {
        let mut schema = self.group_schema();
        for state in &self.states {
            schema = schema.merge(&state.schema());
        }
        schema
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        let mut order: Vec<Vec<Value>> = Vec::new();
        let mut groups: HashMap<Vec<Value>, Vec<Box<dyn AggState>>> = HashMap::new();

        for item in self.child.iterate(tx)? {
            let tuple = item?;

            let mut key = Vec::with_capacity(self.group_exprs.len());
            for expr in &self.group_exprs {
                key.push(expr.eval(&tuple)?);
            }

            let states = match groups.entry(key) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    order.push(entry.key().clone());
                    entry.insert(self.states.iter().map(|s| s.boxed_clone()).collect())
                }
            };
            for state in states.iter_mut() {
                state.add(&tuple)?;
            }
        }

        let group_schema = self.group_schema();
        let mut results = Vec::with_capacity(order.len());
        for key in order {
            let states = groups
                .remove(&key)
                .ok_or_else(|| Error::NotFound("aggregation group vanished".to_string()))?;

            let mut schema = group_schema.clone();
            let mut values = key;
            for state in &states {
                let finalized = state.finalize()?;
                schema = schema.merge(finalized.schema());
                values.extend(finalized.into_values());
            }
            results.push(Tuple::new(schema, values)?);
        }

        Ok(Box::new(results.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        executor::SeqScan,
        test_util::get_temp_table,
    };

    fn sales_table() -> (
        crate::storage::TablePtr,
        std::sync::Arc<crate::storage::BufferPool>,
        tempfile::TempDir,
    ) {
        let (file, pool, dir) = get_temp_table(8);
        file.load_rows(vec![
            vec!["1".to_string(), "apple".to_string()],
            vec!["2".to_string(), "apple".to_string()],
            vec!["3".to_string(), "banana".to_string()],
            vec!["4".to_string(), "banana".to_string()],
        ])
        .unwrap();
        (file, pool, dir)
    }

    fn single_row(plan: &Aggregate, tx: TransactionId) -> Tuple {
        let rows: Vec<Tuple> = plan
            .iterate(tx)
            .unwrap()
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(rows.len(), 1);
        rows.into_iter().next().unwrap()
    }

    #[test]
    fn ungrouped_aggregates_fold_the_whole_input() {
        let (file, pool, _dir) = sales_table();
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let a = || Expression::column("a", DataType::Int);
        let plan = Aggregate::new(
            vec![],
            vec![
                Box::new(SumState::new("total", a())),
                Box::new(CountState::new("n", a())),
                Box::new(AvgState::new("mean", a())),
                Box::new(MinState::new("low", a())),
                Box::new(MaxState::new("high", a())),
            ],
            Box::new(SeqScan::new(file.clone())),
        );

        let row = single_row(&plan, tx);
        assert_eq!(row.value(0), Some(&Value::Int(10)));
        assert_eq!(row.value(1), Some(&Value::Int(4)));
        assert_eq!(row.value(2), Some(&Value::Int(2)), "10 / 4 truncates");
        assert_eq!(row.value(3), Some(&Value::Int(1)));
        assert_eq!(row.value(4), Some(&Value::Int(4)));
    }

    #[test]
    fn grouped_sum_partitions_by_key() {
        let (file, pool, _dir) = sales_table();
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let plan = Aggregate::new(
            vec![Expression::column("b", DataType::Str)],
            vec![Box::new(SumState::new(
                "total",
                Expression::column("a", DataType::Int),
            ))],
            Box::new(SeqScan::new(file.clone())),
        );

        let mut rows: Vec<(String, i64)> = plan
            .iterate(tx)
            .unwrap()
            .map(|t| {
                let t = t.unwrap();
                match (t.value(0).unwrap(), t.value(1).unwrap()) {
                    (Value::Str(b), Value::Int(total)) => (b.clone(), *total),
                    _ => panic!("unexpected tuple {}", t),
                }
            })
            .collect();
        rows.sort();
        assert_eq!(
            rows,
            vec![("apple".to_string(), 3), ("banana".to_string(), 7)]
        );
    }

    #[test]
    fn min_and_max_work_over_strings() {
        let (file, pool, _dir) = sales_table();
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let b = || Expression::column("b", DataType::Str);
        let plan = Aggregate::new(
            vec![],
            vec![
                Box::new(MinState::new("low", b())),
                Box::new(MaxState::new("high", b())),
            ],
            Box::new(SeqScan::new(file.clone())),
        );

        let row = single_row(&plan, tx);
        assert_eq!(row.value(0), Some(&Value::Str("apple".to_string())));
        assert_eq!(row.value(1), Some(&Value::Str("banana".to_string())));
        // the state's declared column type stays Int; the emitted tuple
        // carries the observed variant
        assert_eq!(plan.schema().columns()[0].data_type, DataType::Int);
        assert_eq!(row.schema().columns()[0].data_type, DataType::Str);
    }

    #[test]
    fn aggregate_over_empty_input_emits_nothing() {
        let (file, pool, _dir) = get_temp_table(8);
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let plan = Aggregate::new(
            vec![],
            vec![Box::new(CountState::new(
                "n",
                Expression::column("a", DataType::Int),
            ))],
            Box::new(SeqScan::new(file.clone())),
        );
        assert_eq!(plan.iterate(tx).unwrap().count(), 0);
    }

    #[test]
    fn csv_sum_matches_the_loaded_rows() {
        let (file, pool, _dir) = get_temp_table(8);
        file.load_csv("a,b\n1,x\n2,y\n3,z\n".as_bytes(), true, ',', false)
            .unwrap();

        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let plan = Aggregate::new(
            vec![],
            vec![Box::new(SumState::new(
                "total",
                Expression::column("a", DataType::Int),
            ))],
            Box::new(SeqScan::new(file.clone())),
        );
        let row = single_row(&plan, tx);
        assert_eq!(row.value(0), Some(&Value::Int(6)));
    }
}
