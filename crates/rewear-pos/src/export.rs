//! CSV rendering and amount formatting shared by the customer and price matrix exports.

/// Formats cents as a two-decimal franc amount, e.g. `-1205` -> `-12.05`.
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Parses a franc amount such as `12`, `12.5` or `12,50` into cents.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (whole, fraction) = match digits.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > 2 || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };
    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}

/// Prefixes cells that spreadsheet software would evaluate as formulas.
pub fn sanitize_cell(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{value}"),
        _ => value.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer could not be flushed: {0}")]
    Flush(String),
}

/// Writes a header row plus data rows. Callers sanitize free-text cells;
/// numeric cells such as negative balances are written as given.
pub fn render_csv<I>(header: &[&str], rows: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.error().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_negative_and_small_amounts() {
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(1250), "12.50");
        assert_eq!(format_amount(-1205), "-12.05");
    }

    #[test]
    fn parses_common_amount_spellings() {
        assert_eq!(parse_amount("12"), Some(1200));
        assert_eq!(parse_amount("12.5"), Some(1250));
        assert_eq!(parse_amount(" 12,05 "), Some(1205));
        assert_eq!(parse_amount("-3.10"), Some(-310));
        assert_eq!(parse_amount(".5"), Some(50));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("12.345"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn formula_cells_are_escaped() {
        assert_eq!(sanitize_cell("=cmd|' /C calc'!A0"), "'=cmd|' /C calc'!A0");
        assert_eq!(sanitize_cell("@SUM(A1)"), "'@SUM(A1)");
        assert_eq!(sanitize_cell("Maria"), "Maria");
        assert_eq!(sanitize_cell(""), "");
    }

    #[test]
    fn renders_header_and_rows() {
        let bytes = render_csv(
            &["name", "amount"],
            vec![vec![sanitize_cell("=evil"), format_amount(-100)]],
        )
        .expect("csv renders");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text, "name,amount\n'=evil,-1.00\n");
    }
}
