//! Pure string layout for multi-column lines: two-column rows, table rows,
//! and the separator. Nothing here touches the printer.

/// Divider printed by separator jobs (one Small-size line).
pub const SEPARATOR: &str = "================================";

/// Width of each field in a three-column table row.
pub const TABLE_FIELD_WIDTH: usize = 10;

fn chunks(segment: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = segment.chars().collect();
    if chars.is_empty() || width == 0 {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

fn column_lines(text: &str, width: usize) -> Vec<String> {
    text.split('\n').flat_map(|seg| chunks(seg, width)).collect()
}

/// Lay out `left` and `right` as rows exactly `width` characters wide.
///
/// The right column gets as much room as its longest segment needs, up to
/// half the line; the left column gets the rest minus one pad character.
/// Newlines break a column locally. Rows pair up index by index until both
/// columns run out, and the gap in each row is filled with `pad`.
///
/// ```
/// use termica::encoder::layout::two_column;
///
/// let rows = two_column("Coffee", "$3.50", 32, '.');
/// assert_eq!(rows, vec![format!("Coffee{}$3.50", ".".repeat(21))]);
/// ```
pub fn two_column(left: &str, right: &str, width: usize, pad: char) -> Vec<String> {
    let longest_right = right
        .split('\n')
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0);
    let right_width = longest_right.min(width / 2);
    let left_width = width.saturating_sub(right_width + 1).max(1);

    let lefts = column_lines(left, left_width);
    let rights = column_lines(right, right_width);
    let rows = lefts.len().max(rights.len());

    (0..rows)
        .map(|i| {
            let l = lefts.get(i).map(String::as_str).unwrap_or("");
            let r = rights.get(i).map(String::as_str).unwrap_or("");
            let gap = width.saturating_sub(l.chars().count() + r.chars().count());
            let mut row = String::with_capacity(width);
            row.push_str(l);
            row.extend(std::iter::repeat_n(pad, gap));
            row.push_str(r);
            row
        })
        .collect()
}

/// Lay out a table row. Three columns use fixed 10-character fields; two
/// columns fall back to [`two_column`] with space padding.
pub fn table_row(col1: &str, col2: &str, col3: Option<&str>, width: usize) -> Vec<String> {
    match col3 {
        Some(col3) => vec![format!(
            "{:<w$.w$} {:<w$.w$} {:<w$.w$}",
            col1,
            col2,
            col3,
            w = TABLE_FIELD_WIDTH
        )],
        None => two_column(col1, col2, width, ' '),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_column_dots() {
        let rows = two_column("Coffee", "$3.50", 32, '.');
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chars().count(), 32);
        assert_eq!(rows[0].matches('.').count(), 21 + 1); // "$3.50" has one dot
        assert!(rows[0].starts_with("Coffee."));
        assert!(rows[0].ends_with("$3.50"));
    }

    #[test]
    fn test_two_column_spaces_medium() {
        let rows = two_column("Tea", "2", 24, ' ');
        assert_eq!(rows, vec![format!("Tea{}2", " ".repeat(20))]);
    }

    #[test]
    fn test_two_column_long_left_wraps() {
        let left = "A very long item name that cannot fit";
        let rows = two_column(left, "$10", 32, '.');
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.chars().count() == 32));
        assert!(rows[0].ends_with("$10"));
        assert_eq!(rows[0].chars().take(28).collect::<String>(), &left[..28]);
        assert!(rows[1].starts_with("annot fit"));
        assert!(rows[1].ends_with('.'));
    }

    #[test]
    fn test_two_column_embedded_breaks() {
        let rows = two_column("Line one\nLine two", "1\n2\n3", 32, ' ');
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("Line one") && rows[0].ends_with('1'));
        assert!(rows[1].starts_with("Line two") && rows[1].ends_with('2'));
        assert_eq!(rows[2], format!("{}3", " ".repeat(31)));
    }

    #[test]
    fn test_two_column_right_capped_at_half() {
        let right = "R".repeat(20);
        let rows = two_column("L", &right, 32, ' ');
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with(&"R".repeat(16)));
        assert!(rows[1].ends_with("RRRR"));
    }

    #[test]
    fn test_three_column_table() {
        let rows = table_row("Item", "Qty", Some("A long price column"), 32);
        assert_eq!(rows, vec!["Item       Qty        A long pri".to_string()]);
        assert_eq!(rows[0].len(), 32);
    }

    #[test]
    fn test_two_column_table() {
        let rows = table_row("Name", "Value", None, 32);
        assert_eq!(rows, vec![format!("Name{}Value", " ".repeat(23))]);
    }

    #[test]
    fn test_separator_width() {
        assert_eq!(SEPARATOR.len(), 32);
        assert!(SEPARATOR.chars().all(|c| c == '='));
    }
}
