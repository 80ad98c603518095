//! Minimal CSV table writer (RFC 4180 quoting)

/// In-memory table written as one CSV file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.header).chain(&self.rows) {
            let cells: Vec<String> = line.iter().map(|c| quote(c)).collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    /// Empty cell for undefined values
    pub fn opt_f64(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn opt_bool(value: Option<bool>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_csv_string() {
        let mut table = CsvTable::new(["attribute", "value", "selection_rate"]);
        table.push_row(["race", "black", "0.25"]);
        table.push_row(["note", "a, \"b\"", ""]);
        assert_eq!(
            table.to_csv_string(),
            "attribute,value,selection_rate\nrace,black,0.25\nnote,\"a, \"\"b\"\"\",\n"
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_optional_cells() {
        assert_eq!(CsvTable::opt_f64(None), "");
        assert_eq!(CsvTable::opt_f64(Some(0.5)), "0.5");
        assert_eq!(CsvTable::opt_bool(Some(true)), "true");
    }
}
