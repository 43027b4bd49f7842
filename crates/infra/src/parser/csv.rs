//! Minimal RFC 4180 reader for loadplan exports
//!
//! Handles quoted fields (embedded delimiters, doubled quotes, line breaks),
//! CRLF line endings and a leading UTF-8 BOM. The delimiter is sniffed from
//! the first non-empty line.

const CANDIDATE_DELIMITERS: [char; 3] = [',', ';', '\t'];

/// Pick the candidate delimiter that occurs most often outside quotes on
/// the first non-empty line; comma wins ties.
pub fn sniff_delimiter(text: &str) -> char {
    let Some(first_line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return ',';
    };

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for ch in first_line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(idx) = CANDIDATE_DELIMITERS.iter().position(|d| *d == ch) {
                counts[idx] += 1;
            }
        }
    }

    let mut best = 0;
    for (idx, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = idx;
        }
    }
    CANDIDATE_DELIMITERS[best]
}

/// Split `text` into rows of raw, untrimmed fields
pub fn read_rows(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() => in_quotes = true,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c if c == delimiter => row.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_quoted_fields_and_line_endings() {
        let text = concat!(
            "\u{feff}PO,Model,Qty\r\n",
            "\"A1\",\"Runner, \"\"Pro\"\"\",100\r\n",
            "A2,\"Multi\nLine\",5",
        );
        let rows = read_rows(text, ',');

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["PO", "Model", "Qty"]);
        assert_eq!(rows[1], vec!["A1", "Runner, \"Pro\"", "100"]);
        assert_eq!(rows[2], vec!["A2", "Multi\nLine", "5"]);
    }

    #[test]
    fn keeps_empty_trailing_fields() {
        let rows = read_rows("a,,\n,b,\n", ',');
        assert_eq!(rows, vec![vec!["a", "", ""], vec!["", "b", ""]]);
    }

    #[test]
    fn sniffs_semicolon_and_tab_exports() {
        assert_eq!(sniff_delimiter("PO;Model;Qty\n1;2;3"), ';');
        assert_eq!(sniff_delimiter("\nPO\tModel\tQty"), '\t');
        assert_eq!(sniff_delimiter("\"a;b\",c"), ',');
        assert_eq!(sniff_delimiter(""), ',');
    }
}
