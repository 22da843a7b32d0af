// Fixed-width terminal table
// Column widths are measured on visible text, escapes are emitted untouched

use std::fmt;

use super::style;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    head: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(head: Vec<String>) -> Self {
        Self {
            head,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    #[cfg(test)]
    pub fn head(&self) -> &[String] {
        &self.head
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        (0..self.head.len())
            .map(|col| {
                std::iter::once(&self.head)
                    .chain(self.rows.iter())
                    .filter_map(|row| row.get(col))
                    .map(|cell| style::visible_width(cell))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn pad(cell: &str, width: usize) -> String {
    let padding = width.saturating_sub(style::visible_width(cell));
    format!("{cell}{}", " ".repeat(padding))
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let cells: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| pad(cells.get(i).map(String::as_str).unwrap_or(""), *width))
        .collect();
    format!("│ {} │", cells.join(" │ "))
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();
        let rule = "─".repeat(widths.iter().map(|w| w + 3).sum::<usize>() + 1);

        let mut lines = Vec::new();

        if !self.head.is_empty() {
            let head: Vec<String> = self.head.iter().map(|h| style::bold(h)).collect();
            lines.push(rule.clone());
            lines.push(render_row(&head, &widths));
            lines.push(rule.clone());
        }

        for row in &self.rows {
            lines.push(render_row(row, &widths));
        }

        if !self.rows.is_empty() {
            lines.push(rule);
        }

        write!(f, "{}", lines.join("\n"))
    }
}
