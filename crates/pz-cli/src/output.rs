use std::io::Write;

use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    print!("{}", render_table(headers, &rows));
}

/// A column is numeric when every non-empty cell parses as an integer.
fn numeric_columns(columns: usize, rows: &[Vec<String>]) -> Vec<bool> {
    (0..columns)
        .map(|i| {
            let mut cells = rows
                .iter()
                .filter_map(|r| r.get(i))
                .filter(|c| !c.is_empty())
                .peekable();
            cells.peek().is_some() && cells.all(|c| c.parse::<i64>().is_ok())
        })
        .collect()
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], numeric: &[bool]) -> String {
    let padded: Vec<String> = cells
        .zip(widths.iter().zip(numeric))
        .map(|(cell, (&w, &num))| {
            if num {
                format!("{cell:>w$}")
            } else {
                format!("{cell:<w$}")
            }
        })
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

/// Two-space separated columns. Numbers are right-aligned, text left-aligned.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let numeric = numeric_columns(headers.len(), rows);

    let mut out = line(headers.iter().copied(), &widths, &numeric);
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&sep.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str), &widths, &numeric));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_align_right_text_left() {
        let rows = vec![
            vec!["1".to_string(), "Ariel".to_string(), "120".to_string()],
            vec!["2".to_string(), "Loki".to_string(), "8".to_string()],
        ];
        let table = render_table(&["#", "USER", "XP"], &rows);
        assert_eq!(
            table,
            "#  USER    XP\n-  -----  ---\n1  Ariel  120\n2  Loki     8\n"
        );
    }

    #[test]
    fn wide_characters_count_once() {
        let rows = vec![vec!["Zoë".to_string(), "x".to_string()]];
        let table = render_table(&["NAME", "V"], &rows);
        assert_eq!(table, "NAME  V\n----  -\nZoë   x\n");
    }
}
