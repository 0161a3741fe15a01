use crate::{
    catalog::{Column, Schema},
    concurrency::TransactionId,
    executor::{Expression, Operator, TupleStream},
    storage::Tuple,
    Error, Result,
};

use std::collections::HashSet;

/// Emit, for each child tuple, the evaluated expressions under the output
/// names. With `distinct`, repeated projected tuples are suppressed.
pub struct Project {
    exprs: Vec<Expression>,
    names: Vec<String>,
    distinct: bool,
    child: Box<dyn Operator>,
}

impl Project {
    pub fn new(
        exprs: Vec<Expression>,
        names: Vec<String>,
        distinct: bool,
        child: Box<dyn Operator>,
    ) -> Result<Self> {
        if exprs.len() != names.len() {
            return Err(Error::MalformedData(format!(
                "{} expressions but {} output names",
                exprs.len(),
                names.len()
            )));
        }

        Ok(Self {
            exprs,
            names,
            distinct,
            child,
        })
    }

    fn project(&self, schema: &Schema, tuple: &Tuple) -> Result<Tuple> {
        let mut values = Vec::with_capacity(self.exprs.len());
        for expr in &self.exprs {
            values.push(expr.eval(tuple)?);
        }
        Tuple::new(schema.clone(), values)
    }
}

impl Operator for Project {
    fn schema(&self) -> Schema {
        let columns = self
            .exprs
            .iter()
            .zip(&self.names)
            .map(|(expr, name)| Column::new(name, expr.data_type()))
            .collect();
        Schema::new(columns)
    }

    fn iterate(&self, tx: TransactionId) -> Result<TupleStream<'_>> {
        Ok(Box::new(ProjectStream {
            op: self,
            schema: self.schema(),
            child: self.child.iterate(tx)?,
            seen: HashSet::new(),
        }))
    }
}

struct ProjectStream<'a> {
    op: &'a Project,
    schema: Schema,
    child: TupleStream<'a>,
    /// Encoded field bytes of every tuple already emitted, when distinct.
    seen: HashSet<Vec<u8>>,
}

impl<'a> Iterator for ProjectStream<'a> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Result<Tuple>> {
        loop {
            let tuple = match self.child.next()? {
                Ok(tuple) => tuple,
                Err(e) => return Some(Err(e)),
            };

            let projected = match self.op.project(&self.schema, &tuple) {
                Ok(projected) => projected,
                Err(e) => return Some(Err(e)),
            };

            if self.op.distinct {
                let key = match projected.encode() {
                    Ok(key) => key,
                    Err(e) => return Some(Err(e)),
                };
                if !self.seen.insert(key) {
                    continue;
                }
            }

            return Some(Ok(projected));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::DataType,
        executor::SeqScan,
        storage::Value,
        test_util::get_temp_table,
    };

    fn fruit_table() -> (crate::storage::TablePtr, std::sync::Arc<crate::storage::BufferPool>, tempfile::TempDir)
    {
        let (file, pool, dir) = get_temp_table(8);
        file.load_rows(vec![
            vec!["1".to_string(), "apple".to_string()],
            vec!["2".to_string(), "apple".to_string()],
            vec!["3".to_string(), "banana".to_string()],
        ])
        .unwrap();
        (file, pool, dir)
    }

    #[test]
    fn project_renames_and_evaluates() {
        let (file, pool, _dir) = fruit_table();
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let plan = Project::new(
            vec![Expression::column("b", DataType::Str)],
            vec!["fruit".to_string()],
            false,
            Box::new(SeqScan::new(file.clone())),
        )
        .unwrap();

        assert_eq!(plan.schema().columns()[0].name, "fruit");
        assert_eq!(plan.schema().columns()[0].data_type, DataType::Str);
        assert_eq!(plan.iterate(tx).unwrap().count(), 3);
    }

    #[test]
    fn distinct_projection_suppresses_repeats() {
        let (file, pool, _dir) = fruit_table();
        let tx = TransactionId::new();
        pool.begin(tx).unwrap();

        let plan = Project::new(
            vec![Expression::column("b", DataType::Str)],
            vec!["fruit".to_string()],
            true,
            Box::new(SeqScan::new(file.clone())),
        )
        .unwrap();

        let mut fruits: Vec<String> = plan
            .iterate(tx)
            .unwrap()
            .map(|t| match t.unwrap().value(0).unwrap() {
                Value::Str(s) => s.clone(),
                other => panic!("unexpected value {}", other),
            })
            .collect();
        fruits.sort();
        assert_eq!(fruits, vec!["apple".to_string(), "banana".to_string()]);
    }

    #[test]
    fn mismatched_names_are_rejected() {
        let (file, _pool, _dir) = fruit_table();

        match Project::new(
            vec![Expression::column("b", DataType::Str)],
            vec![],
            false,
            Box::new(SeqScan::new(file)),
        ) {
            Err(Error::MalformedData(_)) => {}
            other => panic!(
                "expected malformed data, got {:?}",
                other.map(|_| "project")
            ),
        }
    }
}
