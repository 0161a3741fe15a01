use crate::{
    catalog::{Column, DataType},
    storage::{Tuple, Value},
    Error, Result,
};

use std::cmp::Ordering;

/// An expression evaluated against a tuple: either a column reference or a
/// constant.
#[derive(Debug, Clone)]
pub enum Expression {
    Column {
        qualifier: String,
        name: String,
        data_type: DataType,
    },
    Literal(Value),
}

impl Expression {
    pub fn column(name: &str, data_type: DataType) -> Self {
        Expression::Column {
            qualifier: String::new(),
            name: name.to_string(),
            data_type,
        }
    }

    pub fn qualified_column(qualifier: &str, name: &str, data_type: DataType) -> Self {
        Expression::Column {
            qualifier: qualifier.to_string(),
            name: name.to_string(),
            data_type,
        }
    }

    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Expression::Column { data_type, .. } => *data_type,
            Expression::Literal(value) => value.data_type(),
        }
    }

    pub fn eval(&self, tuple: &Tuple) -> Result<Value> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Column {
                qualifier,
                name,
                data_type,
            } => {
                let i = tuple.schema().resolve_column(qualifier, name)?;
                let value = tuple
                    .value(i)
                    .cloned()
                    .ok_or_else(|| Error::NotFound(format!("no value for column '{}'", name)))?;
                if value.data_type() != *data_type {
                    return Err(Error::TypeMismatch(format!(
                        "column '{}' holds a {:?} value but the expression expects {:?}",
                        name,
                        value.data_type(),
                        data_type
                    )));
                }
                Ok(value)
            }
        }
    }

    /// The column an operator reports for this expression's output.
    pub fn output_column(&self) -> Column {
        match self {
            Expression::Column {
                qualifier,
                name,
                data_type,
            } => Column::with_qualifier(name, qualifier, *data_type),
            Expression::Literal(value) => Column::new("const", value.data_type()),
        }
    }
}

/// Comparison applied between two expression values. `StartsWith` is the
/// string prefix match; everything else uses the values' natural ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    StartsWith,
}

impl Predicate {
    pub fn eval(self, left: &Value, right: &Value) -> Result<bool> {
        if self == Predicate::StartsWith {
            return match (left, right) {
                (Value::Str(l), Value::Str(r)) => Ok(l.starts_with(r.as_str())),
                _ => Err(Error::TypeMismatch(
                    "prefix match needs string operands".to_string(),
                )),
            };
        }

        let ord = left.compare(right)?;
        Ok(match self {
            Predicate::Eq => ord == Ordering::Equal,
            Predicate::Ne => ord != Ordering::Equal,
            Predicate::Lt => ord == Ordering::Less,
            Predicate::Le => ord != Ordering::Greater,
            Predicate::Gt => ord == Ordering::Greater,
            Predicate::Ge => ord != Ordering::Less,
            Predicate::StartsWith => unreachable!(),
        })
    }
}
