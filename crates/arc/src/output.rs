//! Output formatting helpers for the `arc` CLI: JSON for `--json`, plain
//! text otherwise.

use std::io::{self, Write};

use serde::Serialize;

/// Prints a value as pretty-printed JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{json}");
    Ok(())
}

/// Prints a simple two-column table with headers and rows.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{:<width$}", header, width = widths[i]);
    }
    let _ = writeln!(handle);

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{}", "-".repeat(*width));
    }
    let _ = writeln!(handle);

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                let _ = write!(handle, "  ");
            }
            if i < widths.len() {
                let _ = write!(handle, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(handle, "{cell}");
            }
        }
        let _ = writeln!(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_output_smoke() {
        let headers = &["ID", "Score"];
        let rows = vec![vec!["commit:aaa".into(), "0.90".into()], vec!["file:a.rs".into(), "0.42".into()]];
        print_table(headers, &rows);
    }

    #[test]
    fn json_output_smoke() {
        #[derive(Serialize)]
        struct Row {
            id: String,
        }
        print_json(&Row { id: "commit:aaa".into() }).unwrap();
    }
}
