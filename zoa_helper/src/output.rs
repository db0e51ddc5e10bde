use std::fmt::{self, Display};

use itertools::Itertools;
use runway_advisor::RunwayAssessment;

/// Plain text table, numeric columns right aligned.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows
            .push(row.into_iter().map(|cell| cell.to_string()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        (0..self.headers.len())
            .map(|column| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(column))
                    .chain(self.headers.get(column))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or_default()
            })
            .collect()
    }

    fn is_numeric_column(&self, column: usize) -> bool {
        !self.rows.is_empty()
            && self
                .rows
                .iter()
                .filter_map(|row| row.get(column))
                .all(|cell| cell.parse::<f64>().is_ok())
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();
        let numeric: Vec<bool> = (0..widths.len())
            .map(|column| self.is_numeric_column(column))
            .collect();

        let format_row = |cells: &[String]| {
            widths
                .iter()
                .enumerate()
                .map(|(column, &width)| {
                    let cell = cells.get(column).map(String::as_str).unwrap_or_default();
                    if numeric[column] {
                        format!("{cell:>width$}")
                    } else {
                        format!("{cell:<width$}")
                    }
                })
                .join("  ")
                .trim_end()
                .to_string()
        };

        writeln!(f, "{}", format_row(&self.headers))?;
        writeln!(f, "{}", widths.iter().map(|&width| "-".repeat(width)).join("  "))?;
        for row in &self.rows {
            writeln!(f, "{}", format_row(row))?;
        }
        Ok(())
    }
}

pub(crate) fn runway_table(assessment: &RunwayAssessment) -> Table {
    let mut table = Table::new(["Runway", "Headwind", "Crosswind"]);
    for (runway, headwind, crosswind) in assessment.table_rows() {
        table.push_row([runway, headwind.to_string(), crosswind.to_string()]);
    }
    table
}

#[cfg(test)]
mod tests {
    use runway_advisor::{WindObservation, sfo_runways};

    use super::*;

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new(["Command", "Count"]);
        table.push_row([".sfolax", "12"]);
        table.push_row([".a", "3"]);
        assert_eq!(
            table.to_string(),
            "Command  Count\n\
             -------  -----\n\
             .sfolax     12\n\
             .a           3\n"
        );
    }

    #[test]
    fn test_sfo_runway_table() {
        let assessment =
            RunwayAssessment::compute(&sfo_runways(), &WindObservation::new(300.0, 15.0));
        let text = runway_table(&assessment).to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Runway  Headwind  Crosswind");
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2], "28            14          4");
        assert_eq!(lines[3], "10           -14         -4");
    }

    #[test]
    fn test_empty_table_has_only_headers() {
        let table = Table::new(["Route", "Notes"]);
        assert!(table.is_empty());
        assert_eq!(table.to_string(), "Route  Notes\n-----  -----\n");
    }
}
