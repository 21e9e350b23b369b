//! Numeric sanitizer
//!
//! Every number that crosses in from a price, dividend or fundamentals source
//! goes through [`sanitize`] before any arithmetic. Null, empty, unparseable,
//! NaN and infinite inputs all become `0.0`; nothing here can panic.

use crate::types::PriceSeries;
use num_traits::ToPrimitive;

/// A value that may be coerced into an `f64`
pub trait Sanitize {
    /// Raw conversion, before the finiteness check. `None` when the value
    /// has no numeric reading at all.
    fn raw_f64(&self) -> Option<f64>;
}

macro_rules! impl_sanitize_primitive {
    ($($t:ty),*) => {
        $(
            impl Sanitize for $t {
                fn raw_f64(&self) -> Option<f64> {
                    ToPrimitive::to_f64(self)
                }
            }
        )*
    };
}

impl_sanitize_primitive!(f64, f32, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Sanitize for bool {
    fn raw_f64(&self) -> Option<f64> {
        Some(if *self { 1.0 } else { 0.0 })
    }
}

impl Sanitize for str {
    fn raw_f64(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok()
    }
}

impl Sanitize for String {
    fn raw_f64(&self) -> Option<f64> {
        self.as_str().raw_f64()
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn raw_f64(&self) -> Option<f64> {
        self.as_ref().and_then(Sanitize::raw_f64)
    }
}

/// Series-like inputs read their first element
impl<T: Sanitize> Sanitize for [T] {
    fn raw_f64(&self) -> Option<f64> {
        self.first().and_then(Sanitize::raw_f64)
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn raw_f64(&self) -> Option<f64> {
        self.as_slice().raw_f64()
    }
}

impl<T: Sanitize + ?Sized> Sanitize for &T {
    fn raw_f64(&self) -> Option<f64> {
        (**self).raw_f64()
    }
}

impl Sanitize for PriceSeries {
    fn raw_f64(&self) -> Option<f64> {
        self.first_close()
    }
}

/// JSON from a provider. Boxed numbers of the form `{"raw": 1.5, "fmt": "1.50"}`
/// are unwrapped to their raw value.
impl Sanitize for serde_json::Value {
    fn raw_f64(&self) -> Option<f64> {
        use serde_json::Value;
        match self {
            Value::Null => None,
            Value::Bool(b) => b.raw_f64(),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.raw_f64(),
            Value::Array(items) => items.first().and_then(Sanitize::raw_f64),
            Value::Object(map) => map.get("raw").and_then(Sanitize::raw_f64),
        }
    }
}

/// Coerce any numeric-like input into a finite float, defaulting to `0.0`
pub fn sanitize<T: Sanitize + ?Sized>(value: &T) -> f64 {
    value
        .raw_f64()
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Sanitize, then round to `places` decimal places
pub fn rounded(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    sanitize(&((sanitize(&value) * factor).round() / factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_sentinels_become_zero() {
        assert_eq!(sanitize(&f64::NAN), 0.0);
        assert_eq!(sanitize(&f64::INFINITY), 0.0);
        assert_eq!(sanitize(&f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(&None::<f64>), 0.0);
        assert_eq!(sanitize(&Vec::<f64>::new()), 0.0);
        assert_eq!(sanitize(&PriceSeries::new()), 0.0);
    }

    #[test]
    fn test_plain_values_pass_through() {
        assert_eq!(sanitize(&3.7), 3.7);
        assert_eq!(sanitize(&Some(2.5)), 2.5);
        assert_eq!(sanitize(&42_i64), 42.0);
        assert_eq!(sanitize(&7_u32), 7.0);
    }

    #[test]
    fn test_series_reads_first_element() {
        assert_eq!(sanitize(&vec![1.5, 9.0]), 1.5);
        assert_eq!(sanitize(&[f64::NAN, 9.0][..]), 0.0);

        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let series = PriceSeries::from_points(vec![(d, 10.0), (d.succ_opt().unwrap(), 11.0)]);
        assert_eq!(sanitize(&series), 10.0);
    }

    #[test]
    fn test_strings() {
        assert_eq!(sanitize("  12.5 "), 12.5);
        assert_eq!(sanitize("abc"), 0.0);
        assert_eq!(sanitize(""), 0.0);
        assert_eq!(sanitize("NaN"), 0.0);
        assert_eq!(sanitize("inf"), 0.0);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(sanitize(&json!(null)), 0.0);
        assert_eq!(sanitize(&json!(1.25)), 1.25);
        assert_eq!(sanitize(&json!("3")), 3.0);
        assert_eq!(sanitize(&json!({"raw": 4.5, "fmt": "4.50"})), 4.5);
        assert_eq!(sanitize(&json!({})), 0.0);
        assert_eq!(sanitize(&json!([])), 0.0);
        assert_eq!(sanitize(&json!([8.0, 1.0])), 8.0);
    }

    #[test]
    fn test_rounded() {
        assert_eq!(rounded(1.23456, 2), 1.23);
        assert_eq!(rounded(1.235_1, 2), 1.24);
        assert_eq!(rounded(f64::NAN, 2), 0.0);
        assert_eq!(rounded(12.345, 1), 12.3);
    }
}
