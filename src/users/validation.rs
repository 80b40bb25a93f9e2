//! Request validation and sanitization.
//!
//! A [`Schema`] is an ordered list of fields, each with an ordered list of
//! rules. Checks and sanitizers share one chain, so a sanitizer rewrites the
//! value that later rules see. Evaluation stops at the first failing rule and
//! reports only that rule's message.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::users::dto::{NewUser, UserPatch};

pub const INVALID_ID: &str = "Invalid user id";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone)]
enum Rule {
    Required(&'static str),
    String(&'static str),
    MinLen(usize, &'static str),
    MaxLen(usize, &'static str),
    Trim,
    Escape,
    StripXss,
}

#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    optional: bool,
    rules: Vec<Rule>,
}

impl Field {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
            rules: Vec::new(),
        }
    }

    /// An absent key skips every rule. `null` still counts as present.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self, msg: &'static str) -> Self {
        self.rules.push(Rule::Required(msg));
        self
    }

    pub fn string(mut self, msg: &'static str) -> Self {
        self.rules.push(Rule::String(msg));
        self
    }

    pub fn min_len(mut self, n: usize, msg: &'static str) -> Self {
        self.rules.push(Rule::MinLen(n, msg));
        self
    }

    pub fn max_len(mut self, n: usize, msg: &'static str) -> Self {
        self.rules.push(Rule::MaxLen(n, msg));
        self
    }

    pub fn trim(mut self) -> Self {
        self.rules.push(Rule::Trim);
        self
    }

    pub fn escape(mut self) -> Self {
        self.rules.push(Rule::Escape);
        self
    }

    pub fn strip_xss(mut self) -> Self {
        self.rules.push(Rule::StripXss);
        self
    }

    fn run(&self, input: Option<&Value>) -> Result<Option<String>, ValidationError> {
        if input.is_none() && self.optional {
            return Ok(None);
        }
        let mut value = input.cloned().unwrap_or(Value::Null);

        for rule in &self.rules {
            let fail = |message: &'static str| ValidationError {
                field: self.name,
                message,
            };
            match rule {
                Rule::Required(msg) => {
                    if is_empty(&value) {
                        return Err(fail(*msg));
                    }
                }
                Rule::String(msg) => {
                    if !value.is_string() {
                        return Err(fail(*msg));
                    }
                }
                Rule::MinLen(n, msg) => {
                    if text_len(&value) < *n {
                        return Err(fail(*msg));
                    }
                }
                Rule::MaxLen(n, msg) => {
                    if text_len(&value) > *n {
                        return Err(fail(*msg));
                    }
                }
                Rule::Trim => map_text(&mut value, |s| s.trim().to_string()),
                Rule::Escape => map_text(&mut value, escape_html),
                Rule::StripXss => map_text(&mut value, strip_xss),
            }
        }

        Ok(Some(match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        }))
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn text_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Null => 0,
        other => other.to_string().chars().count(),
    }
}

fn map_text(value: &mut Value, f: impl FnOnce(&str) -> String) {
    if let Value::String(s) = value {
        *s = f(s);
    }
}

/// Ordered fields, checked first to last.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

/// Values that passed every rule, after sanitization.
#[derive(Debug, Default)]
pub struct Sanitized(HashMap<&'static str, String>);

impl Sanitized {
    pub fn take(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn validate(&self, input: &Map<String, Value>) -> Result<Sanitized, ValidationError> {
        let mut out = Sanitized::default();
        for field in &self.fields {
            if let Some(v) = field.run(input.get(field.name))? {
                out.0.insert(field.name, v);
            }
        }
        Ok(out)
    }
}

fn email_rules(field: Field) -> Field {
    field
        .string("Email must be a string")
        .trim()
        .escape()
        .max_len(64, "Email must be at most 64 characters long")
        .strip_xss()
}

fn password_rules(field: Field) -> Field {
    field
        .string("Password must be a string")
        .min_len(6, "Password must be at least 6 characters long")
}

lazy_static! {
    static ref CREATE_SCHEMA: Schema = Schema::new(vec![
        password_rules(Field::new("password").required("Password is required")),
        email_rules(Field::new("email").required("Email is required")),
    ]);
    static ref UPDATE_SCHEMA: Schema = Schema::new(vec![
        email_rules(Field::new("email").optional()),
        password_rules(Field::new("password").optional()),
    ]);
    static ref INT_RE: Regex = Regex::new(r"^[-+]?[0-9]+$").unwrap();
    static ref SCRIPT_RE: Regex =
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"(?s)</?[a-zA-Z!][^>]*>").unwrap();
}

pub fn new_user(input: &Map<String, Value>) -> Result<NewUser, ValidationError> {
    let mut clean = CREATE_SCHEMA.validate(input)?;
    Ok(NewUser {
        email: clean.take("email").unwrap_or_default(),
        password: clean.take("password").unwrap_or_default(),
    })
}

/// Empty strings are dropped: they pass the rules but carry nothing to write.
pub fn user_patch(input: &Map<String, Value>) -> Result<UserPatch, ValidationError> {
    let mut clean = UPDATE_SCHEMA.validate(input)?;
    Ok(UserPatch {
        email: clean.take("email").filter(|s| !s.is_empty()),
        password: clean.take("password").filter(|s| !s.is_empty()),
    })
}

pub fn parse_user_id(raw: &str) -> Result<i32, ValidationError> {
    let invalid = ValidationError {
        field: "id",
        message: INVALID_ID,
    };
    if !INT_RE.is_match(raw) {
        return Err(invalid);
    }
    raw.parse::<i32>().map_err(|_| invalid)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            c => out.push(c),
        }
    }
    out
}

/// Drops script/style blocks with their content, then any other tag.
pub fn strip_xss(input: &str) -> String {
    let without_blocks = SCRIPT_RE.replace_all(input, "");
    TAG_RE.replace_all(&without_blocks, "").into_owned()
}
