//! Request body validation.
//!
//! Wire DTOs keep every field optional so that a bad body yields one error per
//! field instead of a single deserialization failure. Each DTO implements
//! [`Validate`], turning itself into a typed input, and handlers receive that
//! typed input through the [`Valid`] extractor. Integer path ids go through
//! [`PathId`] so a malformed id is reported the same way.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// Hands back `value` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn required_text(&mut self, field: &str, value: Option<String>) -> String {
        match trimmed(value) {
            Some(text) => text,
            None => {
                self.push(field, "Required");
                String::new()
            }
        }
    }

    /// Absent is fine, present-but-blank is not.
    pub fn non_blank(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let present = value.is_some();
        let text = trimmed(value);
        if present && text.is_none() {
            self.push(field, "Must not be empty");
        }
        text
    }

    pub fn required_int(&mut self, field: &str, value: Option<LenientInt>) -> i32 {
        match value {
            Some(value) => self.positive(field, &value).unwrap_or_default(),
            None => {
                self.push(field, "Required");
                0
            }
        }
    }

    pub fn optional_int(&mut self, field: &str, value: Option<LenientInt>) -> Option<i32> {
        value.and_then(|value| self.positive(field, &value))
    }

    pub fn required_date(&mut self, field: &str, value: Option<String>) -> Option<DateTime<Utc>> {
        match trimmed(value) {
            Some(raw) => self.date(field, &raw),
            None => {
                self.push(field, "Required");
                None
            }
        }
    }

    pub fn optional_date(&mut self, field: &str, value: Option<String>) -> Option<DateTime<Utc>> {
        trimmed(value).and_then(|raw| self.date(field, &raw))
    }

    pub fn email(&mut self, field: &str, value: Option<String>, required: bool) -> Option<String> {
        let Some(email) = trimmed(value) else {
            if required {
                self.push(field, "Required");
            }
            return None;
        };
        if !looks_like_email(&email) {
            self.push(field, "Invalid email");
            return None;
        }
        Some(email)
    }

    fn positive(&mut self, field: &str, value: &LenientInt) -> Option<i32> {
        match value.as_i64() {
            Some(number) if number > 0 && number <= i64::from(i32::MAX) => Some(number as i32),
            Some(_) => {
                self.push(field, "Must be a positive integer");
                None
            }
            None => {
                self.push(field, "Expected integer");
                None
            }
        }
    }

    fn date(&mut self, field: &str, raw: &str) -> Option<DateTime<Utc>> {
        let parsed = parse_date(raw);
        if parsed.is_none() {
            self.push(field, "Invalid date");
        }
        parsed
    }
}

/// Blank strings count as absent.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && domain.contains('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Integer taken from a JSON number or a numeric string (form inputs send both).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LenientInt(Value);

impl LenientInt {
    pub fn as_i64(&self) -> Option<i64> {
        match &self.0 {
            Value::Number(number) => number.as_i64().or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0)
                    .map(|float| float as i64)
            }),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<i64> for LenientInt {
    fn from(value: i64) -> Self {
        LenientInt(Value::from(value))
    }
}

/// Same wire body as `T`, validated with update semantics (every field optional).
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Patch<T>(pub T);

pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, FieldErrors>;
}

/// JSON body extractor that runs [`Validate`] and yields the typed input.
pub struct Valid<T: Validate>(pub T::Output);

impl<S, T> FromRequest<S> for Valid<T>
where
    T: Validate + DeserializeOwned + Send,
    T::Output: Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                    let mut errors = FieldErrors::new();
                    errors.push("body", rejection.body_text());
                    AppError::from(errors)
                }
                // Missing content type, oversized body: keep axum's status.
                other => AppError::Rejected(other.status(), other.body_text()),
            })?;

        payload.validate().map(Valid).map_err(AppError::from)
    }
}

/// The `{id}` segment of a route, as a positive integer.
pub struct PathId(pub i32);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mut errors = FieldErrors::new();
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) if id > 0 && id <= i64::from(i32::MAX) => return Ok(PathId(id as i32)),
            Ok(_) => errors.push("id", "Must be a positive integer"),
            Err(_) => errors.push("id", "Expected integer"),
        }
        Err(AppError::from(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_int_accepts_numbers_and_numeric_strings() {
        let from_number: LenientInt = serde_json::from_str("8").unwrap();
        let from_text: LenientInt = serde_json::from_str("\" 16 \"").unwrap();
        let from_float: LenientInt = serde_json::from_str("4.0").unwrap();
        let garbage: LenientInt = serde_json::from_str("\"lots\"").unwrap();

        assert_eq!(from_number.as_i64(), Some(8));
        assert_eq!(from_text.as_i64(), Some(16));
        assert_eq!(from_float.as_i64(), Some(4));
        assert_eq!(garbage.as_i64(), None);
    }

    #[test]
    fn collects_one_error_per_bad_field() {
        let mut errors = FieldErrors::new();
        errors.required_text("namaSistem", Some("   ".into()));
        errors.required_int("kebutuhanCPU", Some(LenientInt::from(0)));
        errors.required_int("kebutuhanRAM", None);
        errors.optional_int("port", Some(LenientInt::from(8080)));

        let fields: Vec<String> = errors.into_inner().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["namaSistem", "kebutuhanCPU", "kebutuhanRAM"]);
    }

    #[test]
    fn parses_plain_dates_and_timestamps() {
        let day = parse_date("2025-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-03-01T00:00:00+00:00");

        let stamp = parse_date("2025-03-01T10:30:00+07:00").unwrap();
        assert_eq!(stamp.to_rfc3339(), "2025-03-01T03:30:00+00:00");

        assert!(parse_date("01/03/2025").is_none());
    }

    #[test]
    fn email_validation_is_shallow_but_strict_on_shape() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            errors.email("email", Some("dekan@demo.com".into()), true),
            Some("dekan@demo.com".to_string())
        );
        assert_eq!(errors.email("email", Some("not-an-email".into()), true), None);
        assert_eq!(errors.email("email", None, false), None);
        assert_eq!(errors.into_inner().len(), 1);
    }
}
