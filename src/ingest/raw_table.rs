#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Name of the uploaded file the table came from.
    pub source: String,
    /// Column names as the file claims them, until `normalize` rewrites them.
    pub headers: Vec<String>,
    /// Cleaned cells, one Vec per data row, padded to `headers.len()`.
    /// `None` marks a blank or missing cell.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(source: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Push a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}
