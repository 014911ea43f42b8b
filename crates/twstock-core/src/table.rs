//! String-celled tables as they move from a source through mapping and cleaning.

/// A rectangular table of raw text cells.
///
/// Positional sources produce tables with no column names; every other stage
/// works with named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// A table whose rows are addressed by position only.
    pub fn positional(rows: Vec<Vec<String>>) -> Self {
        Self {
            columns: Vec::new(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at `row` in column `name`; short rows read as missing.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let index = self.column_index(name)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Rewrite every cell of a column in place. Missing columns are left alone.
    pub fn map_column(&mut self, name: &str, mut f: impl FnMut(&str) -> String) {
        let Some(index) = self.column_index(name) else {
            return;
        };
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(index) {
                *cell = f(cell);
            }
        }
    }

    /// Set a column to one value on every row, adding it if needed.
    pub fn set_constant(&mut self, name: &str, value: &str) {
        match self.column_index(name) {
            Some(index) => {
                for row in &mut self.rows {
                    if row.len() <= index {
                        row.resize(index + 1, String::new());
                    }
                    row[index] = value.to_string();
                }
            }
            None => {
                let width = self.columns.len();
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.resize(width, String::new());
                    row.push(value.to_string());
                }
            }
        }
    }

    /// Append a column computed from each row.
    pub fn push_column(&mut self, name: &str, mut f: impl FnMut(&[String]) -> String) {
        let width = self.columns.len();
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.resize(width, String::new());
            let value = f(row);
            row.push(value);
        }
    }

    pub fn drop_column(&mut self, name: &str) {
        let Some(index) = self.column_index(name) else {
            return;
        };
        self.columns.remove(index);
        for row in &mut self.rows {
            if index < row.len() {
                row.remove(index);
            }
        }
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[String]) -> bool) {
        self.rows.retain(|row| keep(row));
    }
}
