use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::QuantityError;

/// Memory key used in resource lists and metrics usage maps
pub const MEMORY: &str = "memory";

/// Largest number of significant digits accepted in a quantity
const MAX_DIGITS: usize = 36;

/// Parse a Kubernetes quantity string into an integer value.
///
/// Accepts the same grammar as the API server: an optionally signed decimal
/// number followed by a binary suffix (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`),
/// a decimal suffix (`n`, `u`, `m`, `k`, `M`, `G`, `T`, `P`, `E`) or a
/// decimal exponent (`e3`, `E-2`). Fractional results are rounded up, so
/// `"100m"` of memory is one byte.
pub fn parse_quantity(s: &str) -> Result<i64, QuantityError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(QuantityError::Empty);
    }

    let (negative, body) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let number_len = body
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(body.len());
    let (number, suffix) = body.split_at(number_len);

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return Err(QuantityError::InvalidNumber(s.to_string()));
    }

    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    if digits.len() > MAX_DIGITS {
        return Err(QuantityError::Overflow(s.to_string()));
    }
    let mut mantissa: i128 = if digits.is_empty() {
        0
    } else {
        digits
            .parse()
            .map_err(|_| QuantityError::InvalidNumber(s.to_string()))?
    };
    if negative {
        mantissa = -mantissa;
    }
    let scale = fraction.len() as i32;

    let overflow = || QuantityError::Overflow(s.to_string());
    let suffix = parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix(s.to_string()))?;
    let value = match suffix {
        Suffix::Binary(power) => {
            let numerator = 2i128
                .checked_pow(power)
                .and_then(|m| mantissa.checked_mul(m))
                .ok_or_else(overflow)?;
            let denominator = pow10(scale).ok_or_else(overflow)?;
            ceil_div(numerator, denominator)
        }
        Suffix::Decimal(exponent) => match exponent.checked_sub(scale) {
            Some(shift) if shift >= 0 => pow10(shift)
                .and_then(|m| mantissa.checked_mul(m))
                .ok_or_else(overflow)?,
            // A shift below i32::MIN is still a negative power of ten.
            shift => match shift.and_then(i32::checked_neg).and_then(pow10) {
                Some(denominator) => ceil_div(mantissa, denominator),
                // Divisor beyond i128: any positive value rounds up to one.
                None => i128::from(mantissa > 0),
            },
        },
    };

    i64::try_from(value).map_err(|_| overflow())
}

/// Read the memory entry of a resource map as bytes, if present.
pub fn memory_of(
    resources: Option<&BTreeMap<String, Quantity>>,
) -> Result<Option<i64>, QuantityError> {
    resources
        .and_then(|r| r.get(MEMORY))
        .map(|q| parse_quantity(&q.0))
        .transpose()
}

enum Suffix {
    /// Power of two
    Binary(u32),
    /// Power of ten
    Decimal(i32),
}

fn parse_suffix(suffix: &str) -> Option<Suffix> {
    let parsed = match suffix {
        "" => Suffix::Decimal(0),
        "n" => Suffix::Decimal(-9),
        "u" => Suffix::Decimal(-6),
        "m" => Suffix::Decimal(-3),
        "k" => Suffix::Decimal(3),
        "M" => Suffix::Decimal(6),
        "G" => Suffix::Decimal(9),
        "T" => Suffix::Decimal(12),
        "P" => Suffix::Decimal(15),
        "E" => Suffix::Decimal(18),
        "Ki" => Suffix::Binary(10),
        "Mi" => Suffix::Binary(20),
        "Gi" => Suffix::Binary(30),
        "Ti" => Suffix::Binary(40),
        "Pi" => Suffix::Binary(50),
        "Ei" => Suffix::Binary(60),
        other => {
            let exponent = other.strip_prefix(['e', 'E'])?;
            Suffix::Decimal(exponent.parse().ok()?)
        }
    };
    Some(parsed)
}

fn pow10(exponent: i32) -> Option<i128> {
    u32::try_from(exponent)
        .ok()
        .and_then(|e| 10i128.checked_pow(e))
}

/// Division rounding toward positive infinity; `denominator` must be positive.
fn ceil_div(numerator: i128, denominator: i128) -> i128 {
    -((-numerator).div_euclid(denominator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!(parse_quantity("0").unwrap(), 0);
        assert_eq!(parse_quantity("1024").unwrap(), 1024);
        assert_eq!(parse_quantity(" 2048 ").unwrap(), 2048);
        assert_eq!(parse_quantity("+12").unwrap(), 12);
        assert_eq!(parse_quantity("-12").unwrap(), -12);
    }

    #[test]
    fn test_parse_binary_suffixes() {
        assert_eq!(parse_quantity("1Ki").unwrap(), 1024);
        assert_eq!(parse_quantity("128Mi").unwrap(), 128 * 1024 * 1024);
        assert_eq!(parse_quantity("1Gi").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_quantity("1.5Gi").unwrap(), 1_610_612_736);
        assert_eq!(parse_quantity("2Ti").unwrap(), 2 * (1i64 << 40));
        // Metrics-server reports working set in Ki
        assert_eq!(parse_quantity("3828292Ki").unwrap(), 3_828_292 * 1024);
    }

    #[test]
    fn test_parse_decimal_suffixes() {
        assert_eq!(parse_quantity("1k").unwrap(), 1000);
        assert_eq!(parse_quantity("512M").unwrap(), 512_000_000);
        assert_eq!(parse_quantity("1.5G").unwrap(), 1_500_000_000);
        assert_eq!(parse_quantity("1E").unwrap(), 1_000_000_000_000_000_000);
    }

    #[test]
    fn test_parse_exponent() {
        assert_eq!(parse_quantity("1e3").unwrap(), 1000);
        assert_eq!(parse_quantity("12E2").unwrap(), 1200);
        assert_eq!(parse_quantity("15e-1").unwrap(), 2);
    }

    #[test]
    fn test_extreme_negative_exponent_rounds_up() {
        assert_eq!(parse_quantity("1e-2147483648").unwrap(), 1);
        assert_eq!(parse_quantity("1.5e-2147483648").unwrap(), 1);
        assert_eq!(parse_quantity("0.5e-2147483647").unwrap(), 1);
        assert_eq!(parse_quantity("0e-2147483648").unwrap(), 0);
        assert_eq!(parse_quantity("-1.5e-2147483648").unwrap(), 0);
    }

    #[test]
    fn test_fractions_round_up() {
        assert_eq!(parse_quantity("100m").unwrap(), 1);
        assert_eq!(parse_quantity("1500m").unwrap(), 2);
        assert_eq!(parse_quantity("1n").unwrap(), 1);
        assert_eq!(parse_quantity("0.1").unwrap(), 1);
        assert_eq!(parse_quantity(".5Ki").unwrap(), 512);
        assert_eq!(parse_quantity("-1500m").unwrap(), -1);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(parse_quantity(""), Err(QuantityError::Empty));
        assert!(matches!(parse_quantity("Mi"), Err(QuantityError::InvalidNumber(_))));
        assert!(matches!(parse_quantity("1.2.3"), Err(QuantityError::InvalidNumber(_))));
        assert!(matches!(parse_quantity("12MB"), Err(QuantityError::UnknownSuffix(_))));
        assert!(matches!(parse_quantity("12ki"), Err(QuantityError::UnknownSuffix(_))));
        assert!(matches!(parse_quantity("16Ei"), Err(QuantityError::Overflow(_))));
    }

    #[test]
    fn test_memory_of_resource_map() {
        let mut resources = BTreeMap::new();
        resources.insert("cpu".to_string(), Quantity("250m".to_string()));
        assert_eq!(memory_of(Some(&resources)).unwrap(), None);

        resources.insert(MEMORY.to_string(), Quantity("64Mi".to_string()));
        assert_eq!(memory_of(Some(&resources)).unwrap(), Some(64 * 1024 * 1024));
        assert_eq!(memory_of(None).unwrap(), None);

        resources.insert(MEMORY.to_string(), Quantity("lots".to_string()));
        assert!(memory_of(Some(&resources)).is_err());
    }
}
