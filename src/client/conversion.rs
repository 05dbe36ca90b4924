// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Coercion of tag values to a node's declared variant type.
//!
//! A write must carry the exact variant type the server declared for the
//! node, so the caller can hand over any [`TagValue`] and the coercion
//! resolves the rest: identity passes through, numeric widenings are always
//! accepted, narrowings only when the value fits, and everything else is a
//! typed mismatch.

use crate::error::{ConversionError, IoServerError, IoServerResult};
use crate::types::{TagValue, VariantType};

/// Coerces `value` into the declared `target` type.
///
/// # Errors
///
/// - [`ConversionError::TypeMismatch`] when the value's kind cannot be
///   represented as the target type (e.g. String → Int32, Null → anything).
/// - [`ConversionError::OutOfRange`] when a numeric value does not fit the
///   target type (e.g. 300 → Byte).
///
/// # Examples
///
/// ```
/// use movicon_opcua::client::coerce_to;
/// use movicon_opcua::types::{TagValue, VariantType};
///
/// let coerced = coerce_to(TagValue::Int32(42), VariantType::Double).unwrap();
/// assert_eq!(coerced, TagValue::Double(42.0));
///
/// assert!(coerce_to(TagValue::from("on"), VariantType::Boolean).is_err());
/// ```
pub fn coerce_to(value: TagValue, target: VariantType) -> IoServerResult<TagValue> {
    // Identity: value already carries the declared type.
    if value.variant_type() == Some(target) {
        return Ok(value);
    }

    let mismatch = |value: &TagValue| {
        IoServerError::conversion(ConversionError::type_mismatch(
            value.type_name(),
            target.name(),
        ))
    };

    match target {
        VariantType::Boolean => match value {
            TagValue::Boolean(v) => Ok(TagValue::Boolean(v)),
            other => Err(mismatch(&other)),
        },

        VariantType::SByte => coerce_integer(value, target, i8::MIN as i128, i8::MAX as i128)
            .map(|v| TagValue::SByte(v as i8)),
        VariantType::Byte => coerce_integer(value, target, 0, u8::MAX as i128)
            .map(|v| TagValue::Byte(v as u8)),
        VariantType::Int16 => coerce_integer(value, target, i16::MIN as i128, i16::MAX as i128)
            .map(|v| TagValue::Int16(v as i16)),
        VariantType::UInt16 => coerce_integer(value, target, 0, u16::MAX as i128)
            .map(|v| TagValue::UInt16(v as u16)),
        VariantType::Int32 => coerce_integer(value, target, i32::MIN as i128, i32::MAX as i128)
            .map(|v| TagValue::Int32(v as i32)),
        VariantType::UInt32 => coerce_integer(value, target, 0, u32::MAX as i128)
            .map(|v| TagValue::UInt32(v as u32)),
        VariantType::Int64 => coerce_integer(value, target, i64::MIN as i128, i64::MAX as i128)
            .map(|v| TagValue::Int64(v as i64)),
        VariantType::UInt64 => coerce_unsigned_64(value, target),

        VariantType::Float => match numeric_as_f64(&value) {
            Some(v) if v.is_finite() && v.abs() <= f32::MAX as f64 => {
                Ok(TagValue::Float(v as f32))
            }
            Some(v) => Err(IoServerError::conversion(ConversionError::out_of_range(
                v.to_string(),
                target.name(),
            ))),
            None => Err(mismatch(&value)),
        },
        VariantType::Double => match numeric_as_f64(&value) {
            Some(v) => Ok(TagValue::Double(v)),
            None => Err(mismatch(&value)),
        },

        VariantType::String => match value {
            TagValue::String(v) => Ok(TagValue::String(v)),
            other => Err(mismatch(&other)),
        },
        VariantType::DateTime => match value {
            TagValue::DateTime(v) => Ok(TagValue::DateTime(v)),
            other => Err(mismatch(&other)),
        },
        VariantType::Guid => match value {
            TagValue::Guid(v) => Ok(TagValue::Guid(v)),
            other => Err(mismatch(&other)),
        },
        VariantType::ByteString => match value {
            TagValue::ByteString(v) => Ok(TagValue::ByteString(v)),
            other => Err(mismatch(&other)),
        },
    }
}

/// Extracts an integer from a numeric value, range-checking against the
/// target's bounds. Floats convert only when they carry an integral value.
fn coerce_integer(
    value: TagValue,
    target: VariantType,
    min: i128,
    max: i128,
) -> IoServerResult<i128> {
    let raw: i128 = match &value {
        TagValue::SByte(v) => *v as i128,
        TagValue::Byte(v) => *v as i128,
        TagValue::Int16(v) => *v as i128,
        TagValue::UInt16(v) => *v as i128,
        TagValue::Int32(v) => *v as i128,
        TagValue::UInt32(v) => *v as i128,
        TagValue::Int64(v) => *v as i128,
        TagValue::UInt64(v) => *v as i128,
        TagValue::Float(v) => float_to_integer(*v as f64, target)?,
        TagValue::Double(v) => float_to_integer(*v, target)?,
        other => {
            return Err(IoServerError::conversion(ConversionError::type_mismatch(
                other.type_name(),
                target.name(),
            )))
        }
    };

    if raw < min || raw > max {
        return Err(IoServerError::conversion(ConversionError::out_of_range(
            raw.to_string(),
            target.name(),
        )));
    }

    Ok(raw)
}

/// UInt64 needs its own path: u64::MAX exceeds i64 but fits u64.
fn coerce_unsigned_64(value: TagValue, target: VariantType) -> IoServerResult<TagValue> {
    let out_of_range = |shown: String| {
        IoServerError::conversion(ConversionError::out_of_range(shown, target.name()))
    };

    match &value {
        TagValue::UInt64(v) => Ok(TagValue::UInt64(*v)),
        TagValue::SByte(_)
        | TagValue::Byte(_)
        | TagValue::Int16(_)
        | TagValue::UInt16(_)
        | TagValue::Int32(_)
        | TagValue::UInt32(_)
        | TagValue::Int64(_) => {
            let raw = coerce_integer(value, target, i128::MIN, i128::MAX)?;
            u64::try_from(raw)
                .map(TagValue::UInt64)
                .map_err(|_| out_of_range(raw.to_string()))
        }
        TagValue::Float(v) => {
            let raw = float_to_integer(*v as f64, target)?;
            u64::try_from(raw)
                .map(TagValue::UInt64)
                .map_err(|_| out_of_range(raw.to_string()))
        }
        TagValue::Double(v) => {
            let raw = float_to_integer(*v, target)?;
            u64::try_from(raw)
                .map(TagValue::UInt64)
                .map_err(|_| out_of_range(raw.to_string()))
        }
        other => Err(IoServerError::conversion(ConversionError::type_mismatch(
            other.type_name(),
            target.name(),
        ))),
    }
}

fn float_to_integer(v: f64, target: VariantType) -> IoServerResult<i128> {
    if !v.is_finite() || v.fract() != 0.0 {
        return Err(IoServerError::conversion(ConversionError::out_of_range(
            v.to_string(),
            target.name(),
        )));
    }
    Ok(v as i128)
}

fn numeric_as_f64(value: &TagValue) -> Option<f64> {
    match value {
        TagValue::Float(v) => Some(*v as f64),
        TagValue::Double(v) => Some(*v),
        TagValue::UInt64(v) => Some(*v as f64),
        _ => value.as_i64().map(|v| v as f64),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(
            coerce_to(TagValue::Double(1.5), VariantType::Double).unwrap(),
            TagValue::Double(1.5)
        );
        assert_eq!(
            coerce_to(TagValue::Boolean(true), VariantType::Boolean).unwrap(),
            TagValue::Boolean(true)
        );
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(
            coerce_to(TagValue::Int16(100), VariantType::Int32).unwrap(),
            TagValue::Int32(100)
        );
        assert_eq!(
            coerce_to(TagValue::Byte(200), VariantType::UInt16).unwrap(),
            TagValue::UInt16(200)
        );
        assert_eq!(
            coerce_to(TagValue::Int32(-5), VariantType::Int64).unwrap(),
            TagValue::Int64(-5)
        );
    }

    #[test]
    fn test_integer_to_float() {
        assert_eq!(
            coerce_to(TagValue::Int32(42), VariantType::Double).unwrap(),
            TagValue::Double(42.0)
        );
        assert_eq!(
            coerce_to(TagValue::Int16(7), VariantType::Float).unwrap(),
            TagValue::Float(7.0)
        );
    }

    #[test]
    fn test_in_range_narrowing() {
        assert_eq!(
            coerce_to(TagValue::Int32(200), VariantType::Byte).unwrap(),
            TagValue::Byte(200)
        );
        assert_eq!(
            coerce_to(TagValue::Int64(-100), VariantType::SByte).unwrap(),
            TagValue::SByte(-100)
        );
    }

    #[test]
    fn test_out_of_range_narrowing() {
        let err = coerce_to(TagValue::Int32(300), VariantType::Byte).unwrap_err();
        assert!(err.is_conversion());
        assert!(err.to_string().contains("out of range"));

        assert!(coerce_to(TagValue::Int32(-1), VariantType::UInt16).is_err());
        assert!(coerce_to(TagValue::Int64(i64::MIN), VariantType::UInt64).is_err());
    }

    #[test]
    fn test_integral_float_to_integer() {
        assert_eq!(
            coerce_to(TagValue::Double(42.0), VariantType::Int32).unwrap(),
            TagValue::Int32(42)
        );
        assert!(coerce_to(TagValue::Double(42.5), VariantType::Int32).is_err());
        assert!(coerce_to(TagValue::Double(f64::NAN), VariantType::Int32).is_err());
    }

    #[test]
    fn test_uint64_edges() {
        assert_eq!(
            coerce_to(TagValue::UInt64(u64::MAX), VariantType::UInt64).unwrap(),
            TagValue::UInt64(u64::MAX)
        );
        assert!(coerce_to(TagValue::UInt64(u64::MAX), VariantType::Int64).is_err());
        assert_eq!(
            coerce_to(TagValue::Int32(5), VariantType::UInt64).unwrap(),
            TagValue::UInt64(5)
        );
    }

    #[test]
    fn test_type_mismatches() {
        assert!(coerce_to(TagValue::from("on"), VariantType::Boolean).is_err());
        assert!(coerce_to(TagValue::Boolean(true), VariantType::Int32).is_err());
        assert!(coerce_to(TagValue::Int32(1), VariantType::String).is_err());
        assert!(coerce_to(TagValue::Null, VariantType::Double).is_err());

        let err = coerce_to(TagValue::from("on"), VariantType::Boolean).unwrap_err();
        assert!(err.to_string().contains("String"));
        assert!(err.to_string().contains("Boolean"));
    }

    #[test]
    fn test_double_widening_from_float() {
        let coerced = coerce_to(TagValue::Float(1.5), VariantType::Double).unwrap();
        match coerced {
            TagValue::Double(v) => assert!((v - 1.5).abs() < 1e-9),
            other => panic!("expected Double, got {:?}", other),
        }
    }

    #[test]
    fn test_float_range_check() {
        assert!(coerce_to(TagValue::Double(f64::MAX), VariantType::Float).is_err());
        assert_eq!(
            coerce_to(TagValue::Double(2.0), VariantType::Float).unwrap(),
            TagValue::Float(2.0)
        );
    }
}
