use std::fmt::Display;

use serde::Deserialize;
use serde_json::{json, Value};

use super::Portable;
use crate::models::Error;

/// Tabular result data: named columns and rows of JSON cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Portable form, `{"columns": [..], "data": [[..], ..]}`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchFrame {
    columns: Vec<String>,
    data: Vec<Vec<Value>>,
}

impl Batch {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Batch, Error> {
        if let Some(idx) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(Error::InvalidBatch(format!(
                "row {} has {} cells, expected {}",
                idx,
                rows[idx].len(),
                columns.len()
            )));
        }
        Ok(Batch { columns, rows })
    }

    pub fn empty() -> Batch {
        Batch::default()
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), Error> {
        if row.len() != self.columns.len() {
            return Err(Error::InvalidBatch(format!(
                "row has {} cells, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

impl Portable for Batch {
    const TAG: &'static str = "__batch__";

    fn to_portable(&self) -> Result<Value, Error> {
        Ok(json!({
            "columns": self.columns,
            "data": self.rows,
        }))
    }

    fn from_portable(value: Value) -> Result<Batch, Error> {
        let frame: BatchFrame =
            serde_json::from_value(value).map_err(|err| Error::InvalidBatch(err.to_string()))?;
        Batch::new(frame.columns, frame.data)
    }
}

impl Display for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(Value::to_string).collect();
            write!(f, "\n{}", cells.join(" | "))?;
        }
        Ok(())
    }
}

#[tokio::test]
async fn batch_new_rejects_ragged_rows() -> anyhow::Result<()> {
    // arrange
    let columns = vec!["a".to_owned(), "b".to_owned()];
    let rows = vec![vec![json!(1), json!(2)], vec![json!(3)]];

    // act
    let batch = Batch::new(columns, rows);

    // assert
    assert!(matches!(batch, Err(Error::InvalidBatch(_))));
    Ok(())
}

#[tokio::test]
async fn batch_portable_form() -> anyhow::Result<()> {
    // arrange
    let batch = Batch::new(vec!["id".into()], vec![vec![json!(1)], vec![json!(2)]])?;

    // act
    let portable = batch.to_portable()?;

    // assert
    assert_eq!(json!({"columns": ["id"], "data": [[1], [2]]}), portable);
    assert_eq!(batch, Batch::from_portable(portable)?);
    Ok(())
}

#[tokio::test]
async fn batch_from_portable_rejects_unknown_shape() -> anyhow::Result<()> {
    // act
    let res = Batch::from_portable(json!({"rows": [[1]]}));

    // assert
    assert!(matches!(res, Err(Error::InvalidBatch(_))));
    Ok(())
}

#[tokio::test]
async fn batch_column_and_equality() -> anyhow::Result<()> {
    // arrange
    let columns = vec!["name".to_owned(), "n".to_owned()];
    let mut a = Batch::new(columns.clone(), vec![vec![json!("x"), json!(1)]])?;
    let b = Batch::new(columns, vec![vec![json!("x"), json!(1)]])?;

    // act & assert
    assert_eq!(a, b);
    assert_eq!(Some(vec![&json!(1)]), a.column("n"));
    assert_eq!(None, a.column("missing"));
    a.push_row(vec![json!("y"), json!(2)])?;
    assert_ne!(a, b);
    assert_eq!(2, a.len());
    assert!(a.push_row(vec![json!("z")]).is_err());
    Ok(())
}
