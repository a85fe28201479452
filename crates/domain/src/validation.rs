//! Field-level validation rules shared by the full-write and partial-update
//! profiles.

use chrono::{Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const EMAIL_EMPTY: &str = "Email shouldn't be empty";
pub const EMAIL_INVALID: &str = "Email is not valid";
pub const FIRST_NAME_EMPTY: &str = "First name shouldn't be empty";
pub const LAST_NAME_EMPTY: &str = "Last name shouldn't be empty";
pub const BIRTH_DATE_EMPTY: &str = "Birth date shouldn't be empty";
pub const BIRTH_DATE_NOT_PAST: &str = "Birth date should be in past";

/// Maximum length of an email address (RFC 5321).
const EMAIL_MAX_LENGTH: usize = 254;

/// Field name to message, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation. The first message recorded for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Minimum age, in whole years, a user must have reached to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgePolicy {
    minimum_age: u32,
}

impl AgePolicy {
    pub const DEFAULT_MINIMUM_AGE: u32 = 18;
    pub const MIN_MINIMUM_AGE: u32 = 1;
    pub const MAX_MINIMUM_AGE: u32 = 99;

    /// Clamps `minimum_age` into `MIN_MINIMUM_AGE..=MAX_MINIMUM_AGE`.
    pub const fn new(minimum_age: u32) -> Self {
        let minimum_age = if minimum_age < Self::MIN_MINIMUM_AGE {
            Self::MIN_MINIMUM_AGE
        } else if minimum_age > Self::MAX_MINIMUM_AGE {
            Self::MAX_MINIMUM_AGE
        } else {
            minimum_age
        };
        Self { minimum_age }
    }

    pub fn minimum_age(&self) -> u32 {
        self.minimum_age
    }

    /// True when `birth_date + minimum_age years` is not after `today`.
    pub fn is_old_enough(&self, birth_date: NaiveDate, today: NaiveDate) -> bool {
        match birth_date.checked_add_months(Months::new(self.minimum_age * 12)) {
            Some(adult_on) => adult_on <= today,
            None => false,
        }
    }

    pub fn message(&self) -> String {
        format!("User must be at least {} years old", self.minimum_age)
    }
}

impl Default for AgePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MINIMUM_AGE)
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LENGTH || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub(crate) fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", EMAIL_EMPTY);
    } else if !is_valid_email(email) {
        errors.add("email", EMAIL_INVALID);
    }
}

pub(crate) fn check_not_blank(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    message: &'static str,
) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

pub(crate) fn check_birth_date(
    errors: &mut ValidationErrors,
    policy: &AgePolicy,
    birth_date: NaiveDate,
    today: NaiveDate,
) {
    if birth_date >= today {
        errors.add("birthDate", BIRTH_DATE_NOT_PAST);
    } else if !policy.is_old_enough(birth_date, today) {
        errors.add("birthDate", policy.message());
    }
}
