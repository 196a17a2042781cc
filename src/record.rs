/// One spreadsheet row: column name to cell text, in sheet column order
///
/// Only non-empty cells are stored, so a key can be absent from some rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowRecord {
    entries: Vec<(String, String)>,
}

impl RowRecord {
    pub fn new() -> Self {
        RowRecord {
            entries: Vec::new(),
        }
    }

    /// Appends a cell, replacing the value if the key is already present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RowRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RowRecord::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Decoded contents of a spreadsheet
///
/// `columns` is always the key list of `rows[0]`; later rows may carry a
/// different key set (see [`Sheet::divergent_rows`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<RowRecord>,
}

impl Sheet {
    /// Builds a sheet whose column list comes from the first row
    ///
    /// # Arguments
    /// * `rows` - Decoded rows in file order
    ///
    /// # Returns
    /// * `Sheet` - Columns are the first row's keys, in that row's order;
    ///   empty when `rows` is empty
    pub fn from_rows(rows: Vec<RowRecord>) -> Self {
        let columns = rows
            .first()
            .map(|first| first.keys().map(str::to_string).collect())
            .unwrap_or_default();

        Sheet { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows whose key set differs from the column list
    pub fn divergent_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| {
                row.len() != self.columns.len() || self.columns.iter().any(|c| !row.contains(c))
            })
            .count()
    }
}
