//! Text parsers behind the built-in scalar types.
//!
//! Each parser receives the trimmed text content of a node (or the value of
//! an attribute) and reports failures as a plain message; the caller wraps it
//! into [`crate::Error::InvalidValue`] with the type name and location.

use base64::Engine;

/// Parse an XML Schema style boolean: `true`, `false`, `1`, `0`.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("`{other}` is not a boolean")),
    }
}

pub fn parse_char(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("`{s}` is not a single character")),
    }
}

fn parse_digits_u128(digits: &str, radix: u32) -> Option<u128> {
    let mut val: u128 = 0;
    let mut saw = false;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let d = c.to_digit(radix)?;
        val = val.checked_mul(radix as u128)?;
        val = val.checked_add(d as u128)?;
        saw = true;
    }
    if saw { Some(val) } else { None }
}

/// Split an optional base prefix (`0x`, `0o`, `0b`) off the digits.
fn split_radix(rest: &str) -> (u32, &str) {
    if let Some(r) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, r)
    } else if let Some(r) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8, r)
    } else if let Some(r) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, r)
    } else {
        (10, rest)
    }
}

pub fn parse_int_signed<T>(s: &str) -> Result<T, String>
where
    T: TryFrom<i128>,
{
    let t = s.trim();
    let (neg, rest) = match t.strip_prefix('+') {
        Some(r) => (false, r),
        None => match t.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, t),
        },
    };
    let (radix, digits) = split_radix(rest);
    let invalid = || format!("`{t}` is not a valid integer");

    let mag = parse_digits_u128(digits, radix).ok_or_else(invalid)?;
    let val: i128 = if neg {
        // i128::MIN has no positive counterpart
        if mag == i128::MIN.unsigned_abs() {
            i128::MIN
        } else {
            let mag: i128 = mag.try_into().map_err(|_| invalid())?;
            -mag
        }
    } else {
        mag.try_into().map_err(|_| invalid())?
    };
    T::try_from(val).map_err(|_| format!("`{t}` is out of range"))
}

pub fn parse_int_unsigned<T>(s: &str) -> Result<T, String>
where
    T: TryFrom<u128>,
{
    let t = s.trim();
    if t.starts_with('-') {
        return Err(format!("`{t}` is negative"));
    }
    let rest = t.strip_prefix('+').unwrap_or(t);
    let (radix, digits) = split_radix(rest);
    let mag = parse_digits_u128(digits, radix).ok_or_else(|| format!("`{t}` is not a valid integer"))?;
    T::try_from(mag).map_err(|_| format!("`{t}` is out of range"))
}

/// Floats accept the XML Schema spellings `NaN`, `INF`, `+INF` and `-INF`
/// in addition to everything `f64::from_str` accepts.
pub fn parse_f64(s: &str) -> Result<f64, String> {
    let t = s.trim();
    match t {
        "NaN" => Ok(f64::NAN),
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        _ => t
            .parse::<f64>()
            .map_err(|_| format!("`{t}` is not a valid floating point value")),
    }
}

pub fn parse_f32(s: &str) -> Result<f32, String> {
    parse_f64(s).map(|v| v as f32)
}

/// Decode base64 text; ASCII whitespace (line wrapping) is ignored.
pub fn parse_base64(s: &str) -> Result<Vec<u8>, String> {
    let cleaned: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| format!("invalid base64: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans() {
        assert_eq!(parse_bool(" true "), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn integers_with_bases_and_separators() {
        assert_eq!(parse_int_signed::<i32>("-0x10"), Ok(-16));
        assert_eq!(parse_int_signed::<i64>("1_000_000"), Ok(1_000_000));
        assert_eq!(parse_int_signed::<i8>("-128"), Ok(-128));
        assert!(parse_int_signed::<i8>("128").is_err());
        assert_eq!(parse_int_unsigned::<u8>("0b1010"), Ok(10));
        assert!(parse_int_unsigned::<u32>("-1").is_err());
        assert!(parse_int_unsigned::<u32>("").is_err());
        assert!(parse_int_signed::<i32>("12a").is_err());
    }

    #[test]
    fn floats_accept_schema_specials() {
        assert!(parse_f64("NaN").is_ok_and(|v| v.is_nan()));
        assert_eq!(parse_f64("-INF"), Ok(f64::NEG_INFINITY));
        assert_eq!(parse_f32("1.5"), Ok(1.5));
        assert!(parse_f64("one").is_err());
    }

    #[test]
    fn chars_and_base64() {
        assert_eq!(parse_char("x"), Ok('x'));
        assert!(parse_char("xy").is_err());
        assert_eq!(parse_base64("aGVs\n bG8="), Ok(b"hello".to_vec()));
        assert!(parse_base64("***").is_err());
    }
}
