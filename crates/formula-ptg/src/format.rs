use std::fmt::Write;

/// Format a 0-based `(row, col)` pair as a relative A1 reference (e.g. `(1, 27)` -> `AB2`).
pub fn format_a1(row: u32, col: u32) -> String {
    let mut out = String::new();
    push_cell_ref(row, col, true, true, &mut out);
    out
}

/// Append an A1 reference, emitting `$` before the absolute parts.
pub fn push_cell_ref(row: u32, col: u32, row_relative: bool, col_relative: bool, out: &mut String) {
    if !col_relative {
        out.push('$');
    }
    push_column_label(col, out);
    if !row_relative {
        out.push('$');
    }
    // 0-based row, 1-based label.
    let _ = write!(out, "{}", u64::from(row) + 1);
}

/// Convert a 0-based column index to an Excel column label and append it to `out`.
pub fn push_column_label(col: u32, out: &mut String) {
    let mut n = u64::from(col) + 1;
    let mut buf = [0u8; 8];
    let mut i = 0usize;
    while n > 0 {
        buf[i] = b'A' + ((n - 1) % 26) as u8;
        i += 1;
        n = (n - 1) / 26;
    }
    for ch in buf[..i].iter().rev() {
        out.push(*ch as char);
    }
}

/// Parse an Excel column label (`A`, `xfd`) into a 0-based column index.
///
/// Returns `None` for empty input, non-letters, or labels that overflow `u32`.
pub fn column_label_to_index(label: &str) -> Option<u32> {
    if label.is_empty() {
        return None;
    }
    let mut acc: u32 = 0;
    for b in label.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_labels() {
        let label = |col| {
            let mut s = String::new();
            push_column_label(col, &mut s);
            s
        };
        assert_eq!(label(0), "A");
        assert_eq!(label(25), "Z");
        assert_eq!(label(26), "AA");
        assert_eq!(label(16_383), "XFD");
    }

    #[test]
    fn column_label_parsing_inverts_formatting() {
        assert_eq!(column_label_to_index("A"), Some(0));
        assert_eq!(column_label_to_index("aa"), Some(26));
        assert_eq!(column_label_to_index("XFD"), Some(16_383));
        assert_eq!(column_label_to_index(""), None);
        assert_eq!(column_label_to_index("A1"), None);
    }

    #[test]
    fn absolute_markers() {
        let mut out = String::new();
        push_cell_ref(4, 1, false, true, &mut out);
        assert_eq!(out, "B$5");
        assert_eq!(format_a1(0, 0), "A1");
    }
}
