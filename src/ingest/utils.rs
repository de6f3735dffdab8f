/// Cell tokens that mean "no value" in exported sheets.
pub const MISSING_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A", "-"];

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// 2) Clean a raw cell, mapping blanks and missing tokens to `None`.
pub fn clean_cell(raw: &str) -> Option<String> {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() || MISSING_TOKENS.contains(&cleaned.as_str()) {
        None
    } else {
        Some(cleaned)
    }
}

/// 3) Parse a numeric cell.
///
/// Accepts plain `1234.5`, decimal comma `1234,5`, grouped European
/// `1.234.567,89` and whole grouped `1.500.000`. Non-finite results are
/// rejected.
///
/// A single dot is always a decimal point: `1.500` is 1.5, never 1500.
/// IGC scores are written that way and one group is not enough to tell.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s: String = raw.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() {
        return None;
    }
    if is_dot_grouped(&s) {
        return s.replace('.', "").parse::<f64>().ok();
    }
    if let Ok(v) = s.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    if !s.contains(',') {
        return None;
    }
    let normalized = if s.contains('.') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `1.500.000`: no comma, two or more dots, every group after the first
/// exactly three digits.
fn is_dot_grouped(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let groups: Vec<&str> = digits.split('.').collect();
    let all_digits = |g: &str| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit());
    groups.len() >= 3
        && groups[0].len() <= 3
        && all_digits(groups[0])
        && groups[1..].iter().all(|g| g.len() == 3 && all_digits(*g))
}

/// 4) Parse a year cell. Spreadsheets often hand years over as `2017.0`.
pub fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= f64::from(i32::MAX) {
        Some(v as i32)
    } else {
        None
    }
}
