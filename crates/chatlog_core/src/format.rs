/// Formats a count with `,` thousands separators.
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `"1 channel"`, `"1,024 channels"`.
pub fn pluralize(count: i64, singular: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{} {singular}{suffix}", format_count(count))
}
