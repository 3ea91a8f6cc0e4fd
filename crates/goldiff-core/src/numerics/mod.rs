/// A single delimited field, classified by a strict numeric parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Integer(i64),
    Real(f64),
    Text(&'a str),
}

impl FieldValue<'_> {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Integer(value) => Some(value as f64),
            Self::Real(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text(_))
    }

    /// The numeric value when it is finite.
    pub fn finite(&self) -> Option<f64> {
        self.as_f64().filter(|value| value.is_finite())
    }

    /// NaN, infinity, or a field that did not parse as a number at all.
    pub fn is_weird(&self) -> bool {
        self.finite().is_none()
    }
}

/// Classifies a field: integer first, then floating point, otherwise text.
///
/// Surrounding whitespace is ignored. Anything after a valid number makes the
/// whole field text.
pub fn parse_field_value(field: &str) -> FieldValue<'_> {
    let trimmed = field.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return FieldValue::Integer(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return FieldValue::Real(value);
    }
    FieldValue::Text(trimmed)
}

/// `|output - expected| / |expected|`, or `None` when `expected` is zero.
pub fn relative_variance(output: f64, expected: f64) -> Option<f64> {
    if expected == 0.0 {
        return None;
    }
    Some(((output - expected) / expected).abs())
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, parse_field_value, relative_variance};

    #[test]
    fn integers_stay_integers() {
        assert_eq!(parse_field_value("12"), FieldValue::Integer(12));
        assert_eq!(parse_field_value(" -7 "), FieldValue::Integer(-7));
        assert_eq!(parse_field_value("12.0"), FieldValue::Real(12.0));
    }

    #[test]
    fn exponent_notation_parses_with_padded_exponents() {
        assert_eq!(parse_field_value("1.2"), FieldValue::Real(1.2));
        assert_eq!(parse_field_value("1.2e03"), FieldValue::Real(1200.0));
        assert_eq!(parse_field_value("1.2e003"), FieldValue::Real(1200.0));
        assert_eq!(parse_field_value("1.2e002"), FieldValue::Real(120.0));
        assert_eq!(parse_field_value("1.2345e006"), FieldValue::Real(1234500.0));
        assert_eq!(parse_field_value("1.2345e002"), FieldValue::Real(123.45));
        assert_eq!(parse_field_value("1.2345e2"), FieldValue::Real(123.45));
        assert_eq!(parse_field_value("-3.6e-05"), FieldValue::Real(-3.6e-5));
        assert_eq!(parse_field_value("3.43318e-043"), FieldValue::Real(3.43318e-43));
    }

    #[test]
    fn trailing_garbage_is_text() {
        assert_eq!(parse_field_value("hello"), FieldValue::Text("hello"));
        assert_eq!(parse_field_value("0.0416%"), FieldValue::Text("0.0416%"));
        assert_eq!(parse_field_value("12abc"), FieldValue::Text("12abc"));
        assert_eq!(parse_field_value("0 1.2e02"), FieldValue::Text("0 1.2e02"));
        assert_eq!(parse_field_value("  "), FieldValue::Text(""));
    }

    #[test]
    fn special_values_are_numeric_but_weird() {
        for token in ["nan", "NaN", "-nan", "inf", "-inf", "Infinity"] {
            let value = parse_field_value(token);
            assert!(value.is_numeric(), "{token} should parse");
            assert!(value.is_weird(), "{token} should be weird");
        }
        assert!(parse_field_value("text").is_weird());
        assert!(!parse_field_value("1.5").is_weird());
        assert_eq!(parse_field_value("inf").finite(), None);
        assert_eq!(parse_field_value("-7").finite(), Some(-7.0));
    }

    #[test]
    fn relative_variance_uses_expected_magnitude() {
        assert_eq!(relative_variance(105.0, 100.0), Some(0.05));
        assert_eq!(relative_variance(300.0, 30.0), Some(9.0));
        assert_eq!(relative_variance(101.1, -100.0), Some(2.011));
        assert_eq!(relative_variance(1.0, 0.0), None);
    }
}
