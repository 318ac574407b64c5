//! Column layout for listings. Widths are measured in visible characters so
//! colored cells line up with plain ones.

use terminal_size::{Width, terminal_size};

const SEPARATOR: &str = " | ";
const MIN_LAST_COLUMN: usize = 10;

/// Width of the attached terminal, if stdout is one.
pub fn terminal_columns() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| usize::from(w))
}

/// Visible length of `s`, skipping ANSI SGR sequences (`ESC [ ... m`).
pub fn display_len(s: &str) -> usize {
    let mut in_escape = false;
    s.chars()
        .filter(|&c| match (in_escape, c) {
            (false, '\x1b') => {
                in_escape = true;
                false
            }
            (true, 'm') => {
                in_escape = false;
                false
            }
            (escaped, _) => !escaped,
        })
        .count()
}

/// Cut `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    match max {
        0 => String::new(),
        _ => text.chars().take(max - 1).chain(std::iter::once('…')).collect(),
    }
}

/// Rows of cells under a header line and an `=` rule.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Visible width of each column: its widest cell.
    pub fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> =
            self.headers.iter().map(|h| display_len(h)).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(display_len(cell));
            }
        }
        widths
    }

    /// Room left for the last column when the table must fit in `total`
    /// columns.
    pub fn last_column_budget(&self, total: usize) -> usize {
        let widths = self.widths();
        let fixed: usize = widths
            .iter()
            .rev()
            .skip(1)
            .map(|w| w + SEPARATOR.len())
            .sum();
        total.saturating_sub(fixed)
    }

    /// Truncate each row's last cell to fit `total` columns, then restyle it.
    pub fn fit_last_column(&mut self, total: usize, style: impl Fn(&str) -> String) {
        let budget = self.last_column_budget(total).max(MIN_LAST_COLUMN);
        for row in &mut self.rows {
            if let Some(cell) = row.last_mut() {
                *cell = style(&truncate_with_ellipsis(cell, budget));
            }
        }
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| {
                    format!("{cell}{}", " ".repeat(w.saturating_sub(display_len(cell))))
                })
                .collect();
            padded.join(SEPARATOR).trim_end().to_string()
        };

        let rule_len = widths.iter().sum::<usize>()
            + SEPARATOR.len() * widths.len().saturating_sub(1);
        let mut out = vec![line(&self.headers), "=".repeat(rule_len)];
        out.extend(self.rows.iter().map(|row| line(row)));
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut t = Table::new(vec!["Note".into(), "First line".into()]);
        t.push(vec!["2024-03-05".into(), "Meeting notes".into()]);
        t.push(vec!["x".into(), "y".into()]);
        t
    }

    #[test]
    fn test_render_aligns_columns() {
        let out = table().render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Note       | First line");
        assert_eq!(lines[1], "=".repeat(26));
        assert_eq!(lines[2], "2024-03-05 | Meeting notes");
        assert_eq!(lines[3], "x          | y");
    }

    #[test]
    fn test_last_column_budget() {
        assert_eq!(table().last_column_budget(40), 27);
        assert_eq!(table().last_column_budget(5), 0);

        let mut t = table();
        t.fit_last_column(22, |cell| cell.to_uppercase());
        let out = t.render();
        assert!(out.contains("2024-03-05 | MEETING N…"));
        assert!(out.ends_with("x          | Y"));
    }

    #[test]
    fn test_truncate_and_display_len() {
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_with_ellipsis("abc", 4), "abc");
        assert_eq!(truncate_with_ellipsis("abc", 0), "");
        assert_eq!(display_len("\x1b[1mbold\x1b[0m"), 4);
        assert_eq!(display_len("plain"), 5);
    }
}
