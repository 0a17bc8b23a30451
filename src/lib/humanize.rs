use crate::ByteSizeError;

const KB: f64 = 1000.0;
const KIB: f64 = 1024.0;

/// Parse a human-readable byte size such as `"512MiB"`, `"1.5 GB"` or `"1,024"`.
///
/// Units are case-insensitive. `k`, `kb`, `m`, `mb`, ... are powers of 1000,
/// `ki`, `kib`, `mi`, `mib`, ... are powers of 1024, and `b` or no unit means
/// bytes. Commas in the number are ignored and fractional results truncate.
pub fn parse_bytes(s: &str) -> Result<i64, ByteSizeError> {
    let number_len = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(number_len);

    let number: f64 = number
        .replace(',', "")
        .parse()
        .map_err(|_| ByteSizeError::InvalidNumber(s.to_string()))?;

    let unit = unit.trim().to_lowercase();
    let multiplier =
        unit_multiplier(&unit).ok_or_else(|| ByteSizeError::UnknownUnit(unit.clone()))?;

    let bytes = number * multiplier;
    if bytes >= i64::MAX as f64 {
        return Err(ByteSizeError::TooLarge(s.to_string()));
    }

    Ok(bytes as i64)
}

fn unit_multiplier(unit: &str) -> Option<f64> {
    let multiplier = match unit {
        "" | "b" => 1.0,
        "k" | "kb" => KB,
        "ki" | "kib" => KIB,
        "m" | "mb" => KB.powi(2),
        "mi" | "mib" => KIB.powi(2),
        "g" | "gb" => KB.powi(3),
        "gi" | "gib" => KIB.powi(3),
        "t" | "tb" => KB.powi(4),
        "ti" | "tib" => KIB.powi(4),
        "p" | "pb" => KB.powi(5),
        "pi" | "pib" => KIB.powi(5),
        "e" | "eb" => KB.powi(6),
        "ei" | "eib" => KIB.powi(6),
        _ => return None,
    };
    Some(multiplier)
}

/// Format an integer with thousands separators, e.g. `-1234567` as `-1,234,567`.
pub fn comma(value: i64) -> String {
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

/// Format a ratio with two decimal places.
///
/// Non-finite values are spelled out so a zero-request node shows `NaN` or `+Inf`.
pub fn ratio(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{:.2}", value)
    }
}
