//! Reusable field rules shared by feature schemas. Constraints first, then
//! nullability.

use super::validation::FieldRule;

/// Non-empty string.
pub fn string() -> FieldRule {
    FieldRule::text().min_len(1)
}

pub fn nullable_string(max_length: Option<usize>) -> FieldRule {
    let rule = FieldRule::text();
    match max_length {
        Some(max) => rule.max_len(max).nullable(),
        None => rule.nullable(),
    }
}

/// 1 to 200 characters.
pub fn name() -> FieldRule {
    FieldRule::text().min_len(1).max_len(200)
}

pub fn nullable_description() -> FieldRule {
    FieldRule::text().max_len(500).nullable()
}

/// Foreign key: positive integer.
pub fn fk() -> FieldRule {
    FieldRule::integer().min(1)
}

pub fn nullable_fk() -> FieldRule {
    fk().nullable()
}

/// 0 or 1.
pub fn bit() -> FieldRule {
    FieldRule::integer().min(0).max(1)
}

pub fn date_string() -> FieldRule {
    FieldRule::datetime()
}

pub fn email() -> FieldRule {
    FieldRule::email(255)
}

pub fn nullable_email() -> FieldRule {
    email().nullable()
}

/// Decimal with the column's precision and scale, e.g. `numeric(15, 2)`.
pub fn numeric(precision: u32, scale: u32) -> FieldRule {
    FieldRule::numeric(precision, scale)
}

pub fn nullable_numeric(precision: u32, scale: u32) -> FieldRule {
    numeric(precision, scale).nullable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn accepts(rule: &FieldRule, v: Value) -> bool {
        rule.check(Some(&v)).is_ok()
    }

    #[test]
    fn fk_rejects_zero_and_negative() {
        let rule = fk();
        assert!(!accepts(&rule, json!(0)));
        assert!(!accepts(&rule, json!(-1)));
        assert!(accepts(&rule, json!(1)));
        assert!(!accepts(&rule, json!(1.5)));
        assert!(accepts(&nullable_fk(), Value::Null));
    }

    #[test]
    fn bit_is_zero_or_one() {
        let rule = bit();
        assert!(accepts(&rule, json!(0)));
        assert!(accepts(&rule, json!(1)));
        assert!(!accepts(&rule, json!(2)));
        assert!(!accepts(&rule, json!(-1)));
    }

    #[test]
    fn numeric_allows_zero_and_negatives() {
        let rule = numeric(15, 2);
        assert!(accepts(&rule, json!(0)));
        assert!(accepts(&rule, json!(-1)));
        assert!(accepts(&rule, json!(1234.56)));
        assert!(!accepts(&rule, json!("12")));
        assert!(accepts(&nullable_numeric(15, 2), Value::Null));
    }

    #[test]
    fn email_format() {
        assert!(!accepts(&email(), json!("not-an-email")));
        assert!(accepts(&email(), json!("a@b.com")));
        let long = format!("{}@b.com", "a".repeat(250));
        assert!(!accepts(&email(), json!(long)));
        assert!(accepts(&nullable_email(), Value::Null));
        assert!(!accepts(&email(), Value::Null));
    }

    #[test]
    fn string_lengths() {
        assert!(!accepts(&string(), json!("")));
        assert!(accepts(&string(), json!("x")));
        assert!(!accepts(&name(), json!("")));
        assert!(accepts(&name(), json!("n".repeat(200))));
        assert!(!accepts(&name(), json!("n".repeat(201))));
        assert!(accepts(&nullable_description(), Value::Null));
        assert!(!accepts(&nullable_description(), json!("d".repeat(501))));
        assert!(accepts(&nullable_string(None), json!("")));
        assert!(!accepts(&nullable_string(Some(3)), json!("four")));
    }

    #[test]
    fn date_string_format() {
        assert!(accepts(&date_string(), json!("2024-01-15T08:30:00.000Z")));
        assert!(!accepts(&date_string(), json!("2024-01-15")));
    }
}
