//! Box-drawn tables for terminal listings.

use colored::*;
use console::{measure_text_width, truncate_str};

/// Columns never shrink below this when fitting the terminal.
const MIN_COLUMN: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row.into_iter().map(|c| flatten(&c)).collect());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        let (_, width) = console::Term::stdout().size();
        print!("{}", self.render(width as usize));
    }

    /// Renders the table to fit in `max_width` columns where possible.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(measure_text_width(cell));
            }
        }
        shrink_to_fit(&mut widths, max_width);

        let line = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, segments.join(mid), right)
        };
        let cells = |row: &[String], bold: bool| {
            let mut out = String::from("  │");
            for (cell, &w) in row.iter().zip(&widths) {
                let shown = truncate_str(cell, w, "...");
                let pad = w.saturating_sub(measure_text_width(&shown));
                let shown = if bold {
                    shown.bold().to_string()
                } else {
                    shown.into_owned()
                };
                out.push_str(&format!(" {}{} │", shown, " ".repeat(pad)));
            }
            out.push('\n');
            out
        };

        let mut out = line("┌", "┬", "┐");
        out.push_str(&cells(&self.headers, true));
        out.push_str(&line("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&cells(row, false));
        }
        out.push_str(&line("└", "┴", "┘"));
        out
    }
}

/// Takes one column off the widest column until the table fits or every
/// column is at [`MIN_COLUMN`].
fn shrink_to_fit(widths: &mut [usize], max_width: usize) {
    let overhead = 3 + 3 * widths.len();
    let budget = max_width.saturating_sub(overhead);
    while widths.iter().sum::<usize>() > budget {
        let Some(widest) = widths
            .iter_mut()
            .filter(|w| **w > MIN_COLUMN)
            .max_by_key(|w| **w)
        else {
            break;
        };
        *widest -= 1;
    }
}

fn flatten(cell: &str) -> String {
    cell.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        colored::control::set_override(false);
        let mut table = Table::new(&["#", "Compiler"]);
        table.add_row(vec!["0".into(), "GCC 9.2.0".into()]);
        table.add_row(vec!["ignored".into()]);
        let text = table.render(120);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "  ┌───┬───────────┐");
        assert_eq!(lines[3], "  │ 0 │ GCC 9.2.0 │");
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut widths = vec![4, 40, 20];
        shrink_to_fit(&mut widths, 50);
        assert!(widths.iter().sum::<usize>() <= 50 - 12);
        assert_eq!(widths[0], 4);

        let mut tiny = vec![10, 10];
        shrink_to_fit(&mut tiny, 5);
        assert_eq!(tiny, vec![MIN_COLUMN, MIN_COLUMN]);
    }
}
