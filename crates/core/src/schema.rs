//! Declarative request schemas.
//!
//! A [`RequestSchema`] describes the expected shape of a request in three
//! optional parts: body, query string and path params. Each part is an
//! [`ObjectSchema`] made of named [`FieldRule`]s. Validation never stops at
//! the first problem; it collects one [`Violation`] per offending field so the
//! caller can report all of them at once.
//!
//! Query strings and path params only ever carry strings, so those parts are
//! checked in a coercing mode where `"5"` satisfies an integer rule and
//! `"true"` a boolean one. Bodies are checked strictly.

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Where in the request a violation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Body,
    Query,
    Params,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Body => "body",
            Location::Query => "query",
            Location::Params => "params",
        }
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub location: Location,
    pub path: String,
    pub message: String,
}

/// All violations found in one request, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.message())]
pub struct ValidationFailure {
    violations: Vec<Violation>,
}

impl ValidationFailure {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// A failure with a single free-form message (e.g. an unparseable body).
    pub fn single(location: Location, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                location,
                path: String::new(),
                message: message.into(),
            }],
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Every violation message joined with `", "`.
    pub fn message(&self) -> String {
        self.violations
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Coerce,
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    String {
        non_empty: bool,
        max_len: Option<usize>,
        one_of: Option<Vec<String>>,
    },
    Integer,
    Number,
    Boolean,
    Date,
    Uuid,
    Array {
        items: Box<ObjectSchema>,
        min_items: usize,
    },
    Object(Box<ObjectSchema>),
}

/// Rule for a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    kind: Kind,
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldRule {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            min: None,
            max: None,
        }
    }

    pub fn string() -> Self {
        Self::of(Kind::String {
            non_empty: false,
            max_len: None,
            one_of: None,
        })
    }

    pub fn integer() -> Self {
        Self::of(Kind::Integer)
    }

    pub fn number() -> Self {
        Self::of(Kind::Number)
    }

    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    /// Calendar date in `YYYY-MM-DD` form.
    pub fn date() -> Self {
        Self::of(Kind::Date)
    }

    pub fn uuid() -> Self {
        Self::of(Kind::Uuid)
    }

    pub fn array_of(items: ObjectSchema) -> Self {
        Self::of(Kind::Array {
            items: Box::new(items),
            min_items: 0,
        })
    }

    pub fn object(schema: ObjectSchema) -> Self {
        Self::of(Kind::Object(Box::new(schema)))
    }

    /// Strings only: reject empty or whitespace-only values.
    pub fn non_empty(mut self) -> Self {
        if let Kind::String { non_empty, .. } = &mut self.kind {
            *non_empty = true;
        }
        self
    }

    /// Strings only: maximum length in characters.
    pub fn max_len(mut self, len: usize) -> Self {
        if let Kind::String { max_len, .. } = &mut self.kind {
            *max_len = Some(len);
        }
        self
    }

    /// Strings only: the value must be one of `allowed`.
    pub fn one_of(mut self, allowed: &[&str]) -> Self {
        if let Kind::String { one_of, .. } = &mut self.kind {
            *one_of = Some(allowed.iter().map(|s| s.to_string()).collect());
        }
        self
    }

    /// Arrays only: minimum number of items.
    pub fn min_items(mut self, n: usize) -> Self {
        if let Kind::Array { min_items, .. } = &mut self.kind {
            *min_items = n;
        }
        self
    }

    /// Numeric lower bound (inclusive).
    pub fn min(mut self, value: f64) -> Self {
        self.min = Some(value);
        self
    }

    /// Numeric upper bound (inclusive).
    pub fn max(mut self, value: f64) -> Self {
        self.max = Some(value);
        self
    }

    fn check(&self, value: &Value, path: &str, mode: Mode, out: &mut Vec<String>) {
        match &self.kind {
            Kind::String {
                non_empty,
                max_len,
                one_of,
            } => {
                let Some(s) = value.as_str() else {
                    out.push(format!("{path} must be a string"));
                    return;
                };
                if *non_empty && s.trim().is_empty() {
                    out.push(format!("{path} must not be empty"));
                    return;
                }
                if let Some(max) = max_len {
                    if s.chars().count() > *max {
                        out.push(format!("{path} must be at most {max} characters"));
                    }
                }
                if let Some(allowed) = one_of {
                    if !allowed.iter().any(|a| a == s) {
                        out.push(format!("{path} must be one of: {}", allowed.join(", ")));
                    }
                }
            }
            Kind::Integer => match as_integer(value, mode) {
                Some(n) => self.check_bounds(n as f64, path, out),
                None => out.push(format!("{path} must be an integer")),
            },
            Kind::Number => match as_number(value, mode) {
                Some(n) => self.check_bounds(n, path, out),
                None => out.push(format!("{path} must be a number")),
            },
            Kind::Boolean => {
                let ok = match (value, mode) {
                    (Value::Bool(_), _) => true,
                    (Value::String(s), Mode::Coerce) => s == "true" || s == "false",
                    _ => false,
                };
                if !ok {
                    out.push(format!("{path} must be a boolean"));
                }
            }
            Kind::Date => {
                let ok = value
                    .as_str()
                    .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok());
                if !ok {
                    out.push(format!("{path} must be a date (YYYY-MM-DD)"));
                }
            }
            Kind::Uuid => {
                let ok = value.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok());
                if !ok {
                    out.push(format!("{path} must be a valid UUID"));
                }
            }
            Kind::Array { items, min_items } => {
                let Some(arr) = value.as_array() else {
                    out.push(format!("{path} must be an array"));
                    return;
                };
                if arr.len() < *min_items {
                    out.push(format!("{path} must contain at least {min_items} item(s)"));
                }
                for (idx, item) in arr.iter().enumerate() {
                    items.check_value(item, &format!("{path}[{idx}]"), mode, out);
                }
            }
            Kind::Object(schema) => schema.check_value(value, path, mode, out),
        }
    }

    fn check_bounds(&self, n: f64, path: &str, out: &mut Vec<String>) {
        if let Some(min) = self.min {
            if n < min {
                out.push(format!("{path} must be at least {min}"));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                out.push(format!("{path} must be at most {max}"));
            }
        }
    }
}

fn as_integer(value: &Value, mode: Mode) -> Option<i64> {
    match (value, mode) {
        (Value::Number(n), _) => n.as_i64(),
        (Value::String(s), Mode::Coerce) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value, mode: Mode) -> Option<f64> {
    match (value, mode) {
        (Value::Number(n), _) => n.as_f64(),
        (Value::String(s), Mode::Coerce) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSpec {
    name: String,
    rule: FieldRule,
    required: bool,
}

/// Schema for a JSON object: an ordered list of named fields.
///
/// Fields not mentioned in the schema are ignored. `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<FieldSpec>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            rule,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            rule,
            required: false,
        });
        self
    }

    fn check_value(&self, value: &Value, path: &str, mode: Mode, out: &mut Vec<String>) {
        let Some(obj) = value.as_object() else {
            out.push(format!("{path} must be an object"));
            return;
        };
        for field in &self.fields {
            let field_path = if path.is_empty() {
                field.name.clone()
            } else {
                format!("{path}.{}", field.name)
            };
            match obj.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        out.push(format!("{field_path} is required"));
                    }
                }
                Some(v) => field.rule.check(v, &field_path, mode, out),
            }
        }
    }

    fn validate_part(&self, value: &Value, location: Location, mode: Mode, out: &mut Vec<Violation>) {
        let mut messages = Vec::new();
        if value.is_object() {
            self.check_value(value, "", mode, &mut messages);
        } else {
            messages.push(format!("{} must be an object", location.as_str()));
        }
        out.extend(messages.into_iter().map(|message| Violation {
            location,
            path: message.split_whitespace().next().unwrap_or_default().to_string(),
            message,
        }));
    }
}

/// The three inspected parts of a request, already decoded to JSON.
///
/// Query and params are objects of strings; an absent body is `Value::Null`.
#[derive(Debug, Clone, Copy)]
pub struct RequestInput<'a> {
    pub body: &'a Value,
    pub query: &'a Value,
    pub params: &'a Value,
}

/// Expected shape of a request: body, query string and path params.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSchema {
    pub body: Option<ObjectSchema>,
    pub query: Option<ObjectSchema>,
    pub params: Option<ObjectSchema>,
}

impl RequestSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, schema: ObjectSchema) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn query(mut self, schema: ObjectSchema) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn params(mut self, schema: ObjectSchema) -> Self {
        self.params = Some(schema);
        self
    }

    /// Check every present sub-schema and collect all violations.
    pub fn validate(&self, input: RequestInput<'_>) -> Result<(), ValidationFailure> {
        let mut violations = Vec::new();
        self.validate_params_and_query(&input, &mut violations);
        if let Some(schema) = &self.body {
            schema.validate_part(input.body, Location::Body, Mode::Strict, &mut violations);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(violations))
        }
    }

    /// The body could not be decoded at all. Params and query are still
    /// checked, and `message` is reported after their violations.
    pub fn reject_body(&self, input: RequestInput<'_>, message: impl Into<String>) -> ValidationFailure {
        let mut violations = Vec::new();
        self.validate_params_and_query(&input, &mut violations);
        violations.push(Violation {
            location: Location::Body,
            path: Location::Body.as_str().to_string(),
            message: message.into(),
        });
        ValidationFailure::new(violations)
    }

    fn validate_params_and_query(&self, input: &RequestInput<'_>, out: &mut Vec<Violation>) {
        if let Some(schema) = &self.params {
            schema.validate_part(input.params, Location::Params, Mode::Coerce, out);
        }
        if let Some(schema) = &self.query {
            schema.validate_part(input.query, Location::Query, Mode::Coerce, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lot_schema() -> RequestSchema {
        RequestSchema::new()
            .params(ObjectSchema::new().required("id", FieldRule::uuid()))
            .query(ObjectSchema::new().optional("dry_run", FieldRule::boolean()))
            .body(
                ObjectSchema::new()
                    .required("lot_no", FieldRule::string().non_empty().max_len(8))
                    .required("packages", FieldRule::integer().min(1.0))
                    .optional("grade", FieldRule::string().one_of(&["BOP", "PEKOE"]))
                    .optional("sale_date", FieldRule::date()),
            )
    }

    fn validate(schema: &RequestSchema, body: Value, query: Value, params: Value) -> Result<(), ValidationFailure> {
        schema.validate(RequestInput {
            body: &body,
            query: &query,
            params: &params,
        })
    }

    #[test]
    fn valid_request_passes() {
        let res = validate(
            &lot_schema(),
            json!({"lot_no": "L-1", "packages": 20, "grade": "BOP", "sale_date": "2024-03-01"}),
            json!({"dry_run": "true"}),
            json!({"id": "0190d6a0-0000-7000-8000-000000000000"}),
        );
        assert!(res.is_ok());
    }

    #[test]
    fn collects_every_violation_across_parts() {
        let err = validate(
            &lot_schema(),
            json!({"lot_no": "   ", "packages": 0, "grade": "DUST", "sale_date": "01/03/2024"}),
            json!({"dry_run": "maybe"}),
            json!({"id": "nope"}),
        )
        .unwrap_err();

        let messages: Vec<_> = err.violations().iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "id must be a valid UUID",
                "dry_run must be a boolean",
                "lot_no must not be empty",
                "packages must be at least 1",
                "grade must be one of: BOP, PEKOE",
                "sale_date must be a date (YYYY-MM-DD)",
            ]
        );
        assert_eq!(err.violations()[0].location, Location::Params);
        assert_eq!(err.violations()[2].location, Location::Body);
    }

    #[test]
    fn unreadable_body_still_reports_params_and_query() {
        let err = lot_schema().reject_body(
            RequestInput {
                body: &Value::Null,
                query: &json!({"dry_run": "maybe"}),
                params: &json!({"id": "nope"}),
            },
            "body must be valid JSON",
        );
        assert_eq!(
            err.message(),
            "id must be a valid UUID, dry_run must be a boolean, body must be valid JSON"
        );
        assert_eq!(err.violations()[2].location, Location::Body);
    }

    #[test]
    fn message_is_comma_separated() {
        let schema = RequestSchema::new().body(
            ObjectSchema::new()
                .required("name", FieldRule::string())
                .required("email", FieldRule::string()),
        );
        let err = validate(&schema, json!({}), json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "name is required, email is required");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn null_counts_as_missing() {
        let schema = RequestSchema::new().body(ObjectSchema::new().required("name", FieldRule::string()));
        let err = validate(&schema, json!({"name": null}), json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "name is required");
    }

    #[test]
    fn body_is_strict_about_types() {
        let schema = RequestSchema::new().body(ObjectSchema::new().required("packages", FieldRule::integer()));
        let err = validate(&schema, json!({"packages": "12"}), json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "packages must be an integer");

        let err = validate(&schema, json!({"packages": 1.5}), json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "packages must be an integer");
    }

    #[test]
    fn query_coerces_numbers() {
        let schema = RequestSchema::new().query(
            ObjectSchema::new()
                .optional("page", FieldRule::integer().min(1.0))
                .optional("min_price", FieldRule::number().min(0.0)),
        );
        assert!(validate(&schema, Value::Null, json!({"page": "2", "min_price": "3.5"}), json!({})).is_ok());

        let err = validate(&schema, Value::Null, json!({"page": "x", "min_price": "-1"}), json!({})).unwrap_err();
        assert_eq!(err.message(), "page must be an integer, min_price must be at least 0");
    }

    #[test]
    fn nested_arrays_report_item_paths() {
        let schema = RequestSchema::new().body(
            ObjectSchema::new().required(
                "items",
                FieldRule::array_of(ObjectSchema::new().required("packages", FieldRule::integer().min(1.0)))
                    .min_items(1),
            ),
        );

        let err = validate(&schema, json!({"items": []}), json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "items must contain at least 1 item(s)");

        let err = validate(
            &schema,
            json!({"items": [{"packages": 3}, {"packages": 0}, {}]}),
            json!({}),
            json!({}),
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "items[1].packages must be at least 1, items[2].packages is required"
        );
    }

    #[test]
    fn non_object_body_is_rejected() {
        let schema = RequestSchema::new().body(ObjectSchema::new().optional("x", FieldRule::string()));
        let err = validate(&schema, json!([1, 2]), json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "body must be an object");

        let err = validate(&schema, Value::Null, json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "body must be an object");
    }

    #[test]
    fn max_len_counts_characters() {
        let schema = RequestSchema::new().body(ObjectSchema::new().required("garden", FieldRule::string().max_len(3)));
        assert!(validate(&schema, json!({"garden": "ऊँट"}), json!({}), json!({})).is_ok());
        let err = validate(&schema, json!({"garden": "Assam"}), json!({}), json!({})).unwrap_err();
        assert_eq!(err.message(), "garden must be at most 3 characters");
    }

    #[test]
    fn absent_sub_schemas_are_not_checked() {
        let schema = RequestSchema::new();
        assert!(validate(&schema, json!("anything"), json!(null), json!(null)).is_ok());
    }
}
