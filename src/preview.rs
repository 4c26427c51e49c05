//! Dry-run preview of the lines a substitution would change.

use colored::*;
use similar::{ChangeTag, TextDiff};
use std::io::IsTerminal;
use std::path::Path;

/// Auto-detect if we should use colors
fn should_use_color() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    std::io::stdout().is_terminal()
}

/// Render the changed lines between `old` and `new`, colored when stdout is a terminal.
pub fn render_diff(path: &Path, old: &str, new: &str) -> String {
    format_diff(path, old, new, should_use_color())
}

/// Render changed lines only, `L<n>: - old` / `L<n>: + new`.
pub fn format_diff(path: &Path, old: &str, new: &str, use_color: bool) -> String {
    let mut output = String::new();
    let file = path.display().to_string();

    if use_color {
        output.push_str(&format!("{}\n", file.bold().cyan()));
    } else {
        output.push_str(&format!("{}\n", file));
    }

    let diff = TextDiff::from_lines(old, new);
    let mut changed = 0;

    for change in diff.iter_all_changes() {
        let (line_num, indicator) = match change.tag() {
            ChangeTag::Equal => continue,
            ChangeTag::Delete => (change.old_index().unwrap_or(0) + 1, "-"),
            ChangeTag::Insert => (change.new_index().unwrap_or(0) + 1, "+"),
        };
        let content = change.value().trim_end_matches(['\r', '\n']);

        if use_color {
            let line = match change.tag() {
                ChangeTag::Delete => format!("L{}: {} {}\n", line_num, indicator.red().bold(), content.red()),
                _ => format!("L{}: {} {}\n", line_num, indicator.green().bold(), content.green().bold()),
            };
            output.push_str(&line);
        } else {
            output.push_str(&format!("L{}: {} {}\n", line_num, indicator, content));
        }

        if change.tag() == ChangeTag::Insert {
            changed += 1;
        }
    }

    if use_color {
        output.push_str(&format!(
            "{} line{} would change\n",
            changed.to_string().bold().white(),
            if changed == 1 { "" } else { "s" }
        ));
    } else {
        output.push_str(&format!(
            "{} line{} would change\n",
            changed,
            if changed == 1 { "" } else { "s" }
        ));
    }

    output
}
