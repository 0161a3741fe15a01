use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    catalog::{DataType, Schema},
    storage::consts::STRING_LEN,
    Error, Result,
};

use std::{
    cmp::Ordering,
    fmt::{self, Display},
    io::{Read, Write},
};

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Str(_) => DataType::Str,
        }
    }

    /// Compare two values of the same variant with their natural ordering.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            _ => Err(Error::TypeMismatch(format!(
                "cannot compare {} with {}",
                self, other
            ))),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Value::Int(v) => {
                writer.write_i64::<LittleEndian>(*v)?;
            }
            Value::Str(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > STRING_LEN {
                    return Err(Error::MalformedData(format!(
                        "string value of {} bytes exceeds the {}-byte limit",
                        bytes.len(),
                        STRING_LEN
                    )));
                }
                writer.write_all(bytes)?;
                writer.write_all(&vec![0u8; STRING_LEN - bytes.len()])?;
            }
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R, data_type: DataType) -> Result<Value> {
        match data_type {
            DataType::Int => Ok(Value::Int(reader.read_i64::<LittleEndian>()?)),
            DataType::Str => {
                let mut buf = [0u8; STRING_LEN];
                reader.read_exact(&mut buf)?;
                let end = buf
                    .iter()
                    .rposition(|b| *b != 0)
                    .map(|i| i + 1)
                    .unwrap_or(0);
                let s = String::from_utf8(buf[..end].to_vec()).map_err(|_| {
                    Error::MalformedData("string field is not valid UTF-8".to_string())
                })?;
                Ok(Value::Str(s))
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Record identity: the page and slot a stored tuple lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    pub page_no: usize,
    pub slot_no: usize,
}

impl Rid {
    pub fn new(page_no: usize, slot_no: usize) -> Self {
        Self { page_no, slot_no }
    }
}

/// A row of values together with its schema. Tuples read from storage also
/// carry the record identity they were read from.
///
/// Equality compares schema and values only; the rid is location, not
/// content.
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Schema,
    values: Vec<Value>,
    rid: Option<Rid>,
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Tuple) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

impl Eq for Tuple {}

impl Tuple {
    /// Build a tuple, checking that the values agree with the schema in
    /// arity and type.
    pub fn new(schema: Schema, values: Vec<Value>) -> Result<Tuple> {
        if values.len() != schema.len() {
            return Err(Error::MalformedData(format!(
                "tuple has {} values but its schema has {} columns",
                values.len(),
                schema.len()
            )));
        }
        for (value, column) in values.iter().zip(schema.columns()) {
            if value.data_type() != column.data_type {
                return Err(Error::TypeMismatch(format!(
                    "value '{}' does not match the type of column '{}'",
                    value, column.name
                )));
            }
        }

        Ok(Tuple {
            schema,
            values,
            rid: None,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, i: usize) -> Option<&Value> {
        self.values.get(i)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn rid(&self) -> Option<Rid> {
        self.rid
    }

    pub(crate) fn set_rid(&mut self, rid: Option<Rid>) {
        self.rid = rid;
    }

    /// The packed field bytes of this tuple, exactly as stored on a page.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.schema.tuple_size());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for value in &self.values {
            value.write_to(writer)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R, schema: &Schema) -> Result<Tuple> {
        let mut values = Vec::with_capacity(schema.len());
        for column in schema.columns() {
            values.push(Value::read_from(reader, column.data_type)?);
        }

        Ok(Tuple {
            schema: schema.clone(),
            values,
            rid: None,
        })
    }
}

impl Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (column, value)) in self.schema.columns().iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", column.name, value)?;
        }
        write!(f, "}}")
    }
}
