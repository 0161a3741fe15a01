use crate::{storage::consts::STRING_LEN, Error, Result};

/// Type of a single column. The engine supports 64-bit signed integers and
/// fixed-length strings of at most `STRING_LEN` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Str,
}

impl DataType {
    /// On-disk size of a value of this type.
    pub fn size(self) -> usize {
        match self {
            DataType::Int => 8,
            DataType::Str => STRING_LEN,
        }
    }
}

/// A named column of a schema. The qualifier names the table (or alias) the
/// column came from and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub qualifier: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            qualifier: String::new(),
            data_type,
        }
    }

    pub fn with_qualifier(name: &str, qualifier: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            qualifier: qualifier.to_string(),
            data_type,
        }
    }
}

/// Ordered column list describing the layout of a tuple. Two schemas are
/// equal iff all columns agree on name, qualifier and type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// A new schema with `other`'s columns appended after this schema's.
    pub fn merge(&self, other: &Schema) -> Schema {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Schema { columns }
    }

    /// Size in bytes of one tuple with this schema.
    pub fn tuple_size(&self) -> usize {
        self.columns.iter().map(|c| c.data_type.size()).sum()
    }

    /// Find the column a `qualifier.name` reference denotes.
    ///
    /// A column matches on name; a match with the same qualifier is
    /// preferred. An unqualified reference that matches more than one
    /// column is ambiguous.
    pub fn resolve_column(&self, qualifier: &str, name: &str) -> Result<usize> {
        let mut best = None;

        for (i, column) in self.columns.iter().enumerate() {
            if column.name != name {
                continue;
            }
            if qualifier.is_empty() && best.is_some() {
                return Err(Error::AmbiguousName(format!(
                    "column name '{}' matches more than one column",
                    name
                )));
            }
            if column.qualifier == qualifier || best.is_none() {
                best = Some(i);
            }
        }

        best.ok_or_else(|| {
            Error::NotFound(if qualifier.is_empty() {
                format!("column '{}' not found", name)
            } else {
                format!("column '{}.{}' not found", qualifier, name)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_schema() -> Schema {
        Schema::new(vec![
            Column::new("a", DataType::Int),
            Column::new("b", DataType::Str),
        ])
    }

    #[test]
    fn tuple_size_sums_column_sizes() {
        assert_eq!(two_column_schema().tuple_size(), 8 + STRING_LEN);
    }

    #[test]
    fn merge_appends_columns() {
        let merged = two_column_schema().merge(&two_column_schema());
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.columns()[2].name, "a");
        assert_eq!(merged.columns()[3].name, "b");
    }

    #[test]
    fn resolve_prefers_matching_qualifier() {
        let schema = Schema::new(vec![
            Column::with_qualifier("id", "t1", DataType::Int),
            Column::with_qualifier("id", "t2", DataType::Int),
        ]);

        assert_eq!(schema.resolve_column("t2", "id").unwrap(), 1);
    }

    #[test]
    fn unqualified_resolve_of_duplicate_name_is_ambiguous() {
        let schema = Schema::new(vec![
            Column::with_qualifier("id", "t1", DataType::Int),
            Column::with_qualifier("id", "t2", DataType::Int),
        ]);

        match schema.resolve_column("", "id") {
            Err(Error::AmbiguousName(_)) => {}
            other => panic!("expected ambiguous name, got {:?}", other),
        }
    }

    #[test]
    fn resolve_of_unknown_name_is_not_found() {
        match two_column_schema().resolve_column("", "c") {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected not found, got {:?}", other),
        }
    }
}
