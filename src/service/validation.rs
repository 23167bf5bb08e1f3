//! Declarative request schemas: per-field rules plus async object-level refinements.

use crate::constants::messages;
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// One rejected field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        FieldIssue {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Schema rejection. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}: {}", messages::VALIDATION_ERROR, join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(issue: FieldIssue) -> Self {
        ValidationError { issues: vec![issue] }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.path, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks and normalizes a merged request object.
#[async_trait]
pub trait Schema: Send + Sync {
    async fn parse(&self, candidate: Map<String, Value>) -> Result<Map<String, Value>, ValidationError>;
}

/// Object-level check that may do I/O (e.g. a uniqueness lookup). Runs after
/// every field rule has passed, against the normalized object.
#[async_trait]
pub trait Refinement: Send + Sync {
    async fn check(&self, parsed: &Map<String, Value>) -> Result<(), FieldIssue>;
}

#[derive(Clone, Debug, PartialEq)]
enum Kind {
    Text { min: Option<usize>, max: Option<usize> },
    Integer { min: Option<i64>, max: Option<i64> },
    Numeric { precision: u32, scale: u32 },
    Email { max: usize },
    DateTime,
}

/// Rule for a single field. Build with the constructors here or take one from
/// [`crate::service::validators`].
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRule {
    kind: Kind,
    nullable: bool,
    optional: bool,
    coerce: bool,
}

impl FieldRule {
    fn of(kind: Kind) -> Self {
        FieldRule {
            kind,
            nullable: false,
            optional: false,
            coerce: false,
        }
    }

    pub fn text() -> Self {
        Self::of(Kind::Text { min: None, max: None })
    }

    pub fn integer() -> Self {
        Self::of(Kind::Integer { min: None, max: None })
    }

    /// Any finite number with at most `precision - scale` integer digits and
    /// `scale` fractional digits.
    pub fn numeric(precision: u32, scale: u32) -> Self {
        Self::of(Kind::Numeric { precision, scale })
    }

    pub fn email(max: usize) -> Self {
        Self::of(Kind::Email { max })
    }

    /// ISO-8601 date-time in UTC (`Z` suffix), arbitrary sub-second precision.
    pub fn datetime() -> Self {
        Self::of(Kind::DateTime)
    }

    pub fn min_len(mut self, n: usize) -> Self {
        if let Kind::Text { min, .. } = &mut self.kind {
            *min = Some(n);
        }
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        if let Kind::Text { max, .. } = &mut self.kind {
            *max = Some(n);
        }
        self
    }

    pub fn min(mut self, n: i64) -> Self {
        if let Kind::Integer { min, .. } = &mut self.kind {
            *min = Some(n);
        }
        self
    }

    pub fn max(mut self, n: i64) -> Self {
        if let Kind::Integer { max, .. } = &mut self.kind {
            *max = Some(n);
        }
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Missing key is accepted and left out of the parsed object.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Accept numeric strings for integer and numeric rules. Route parameters and
    /// query values always arrive as strings.
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// `Ok(None)` means the field is absent and allowed to be.
    pub fn check(&self, value: Option<&Value>) -> Result<Option<Value>, String> {
        let v = match value {
            None if self.optional => return Ok(None),
            None => return Err("Required".into()),
            Some(Value::Null) if self.nullable => return Ok(Some(Value::Null)),
            Some(v) => v,
        };
        match &self.kind {
            Kind::Text { min, max } => {
                let s = expect_str(v)?;
                let len = s.chars().count();
                if let Some(min) = min {
                    if len < *min {
                        return Err(format!("String must contain at least {} character(s)", min));
                    }
                }
                if let Some(max) = max {
                    if len > *max {
                        return Err(format!("String must contain at most {} character(s)", max));
                    }
                }
                Ok(Some(v.clone()))
            }
            Kind::Integer { min, max } => {
                let n = self.number_of(v)?;
                let i = as_integer(&n)?;
                if let Some(min) = min {
                    if i < *min {
                        return Err(format!("Number must be greater than or equal to {}", min));
                    }
                }
                if let Some(max) = max {
                    if i > *max {
                        return Err(format!("Number must be less than or equal to {}", max));
                    }
                }
                Ok(Some(Value::Number(i.into())))
            }
            Kind::Numeric { precision, scale } => {
                let n = self.number_of(v)?;
                check_digits(&n, *precision, *scale)?;
                Ok(Some(Value::Number(n)))
            }
            Kind::Email { max } => {
                let s = expect_str(v)?;
                if s.chars().count() > *max {
                    return Err(format!("String must contain at most {} character(s)", max));
                }
                if !is_email(s) {
                    return Err("Invalid email".into());
                }
                Ok(Some(v.clone()))
            }
            Kind::DateTime => {
                let s = expect_str(v)?;
                if !is_utc_datetime(s) {
                    return Err("Invalid datetime".into());
                }
                Ok(Some(v.clone()))
            }
        }
    }

    fn number_of(&self, v: &Value) -> Result<Number, String> {
        match v {
            Value::Number(n) => Ok(n.clone()),
            Value::String(s) if self.coerce => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(i.into());
                }
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .ok_or_else(|| "Expected number, received nan".to_string())
            }
            other => Err(format!("Expected number, received {}", type_name(other))),
        }
    }
}

fn expect_str(v: &Value) -> Result<&str, String> {
    v.as_str()
        .ok_or_else(|| format!("Expected string, received {}", type_name(v)))
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_integer(n: &Number) -> Result<i64, String> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(out_of_range());
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f.fract() != 0.0 || !f.is_finite() {
        return Err("Expected integer, received float".into());
    }
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    Ok(f as i64)
}

fn out_of_range() -> String {
    format!("Number must be between {} and {}", i64::MIN, i64::MAX)
}

fn check_digits(n: &Number, precision: u32, scale: u32) -> Result<(), String> {
    let rendered = match (n.as_i64(), n.as_u64()) {
        (Some(i), _) => i.to_string(),
        (None, Some(u)) => u.to_string(),
        // f64 Display never uses exponent notation.
        _ => format!("{}", n.as_f64().unwrap_or_default()),
    };
    let unsigned = rendered.trim_start_matches('-');
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let int_digits = int_part.trim_start_matches('0').len();
    let frac_digits = frac_part.trim_end_matches('0').len();
    let max_int = precision.saturating_sub(scale) as usize;
    if int_digits > max_int {
        return Err(format!("Number must have at most {} integer digit(s)", max_int));
    }
    if frac_digits > scale as usize {
        return Err(format!("Number must have at most {} decimal place(s)", scale));
    }
    Ok(())
}

fn is_email(s: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    });
    !s.starts_with('.') && !s.contains("..") && re.is_match(s)
}

fn is_utc_datetime(s: &str) -> bool {
    static DATETIME: OnceLock<Regex> = OnceLock::new();
    let re = DATETIME.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z$").expect("datetime pattern compiles")
    });
    re.is_match(s) && chrono::DateTime::parse_from_rfc3339(s).is_ok()
}

/// Object schema: named fields in declaration order, unknown keys stripped.
#[derive(Default)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldRule)>,
    refinements: Vec<Box<dyn Refinement>>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }

    pub fn refine<R: Refinement + 'static>(mut self, refinement: R) -> Self {
        self.refinements.push(Box::new(refinement));
        self
    }
}

#[async_trait]
impl Schema for ObjectSchema {
    async fn parse(&self, candidate: Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut parsed = Map::new();
        let mut issues = Vec::new();
        for (name, rule) in &self.fields {
            match rule.check(candidate.get(name)) {
                Ok(Some(v)) => {
                    parsed.insert(name.clone(), v);
                }
                Ok(None) => {}
                Err(message) => issues.push(FieldIssue::new(name.clone(), message)),
            }
        }
        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }
        for refinement in &self.refinements {
            if let Err(issue) = refinement.check(&parsed).await {
                issues.push(issue);
            }
        }
        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }
        Ok(parsed)
    }
}
