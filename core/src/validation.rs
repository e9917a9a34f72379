//! Caller-side input checks, run by form collaborators before any request.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::{Credentials, PostDraft, Registration};

const MIN_PASSWORD_LEN: usize = 6;

/// `FundingNeeds` is stored as a decimal with at most 10 digits, 2 of them
/// after the point.
const FUNDING_MAX_DIGITS: u32 = 10;
const FUNDING_DECIMAL_PLACES: u32 = 2;

/// Unanchored, so it only asks for some `x@y.z` run of non-space characters.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

impl Credentials {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors.into_result()
    }
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        require(&mut errors, "username", &self.username, "Username is required");
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        if self.password != self.password_confirm {
            errors.add("password_confirm", "Passwords do not match");
        }
        require(&mut errors, "ANumber", &self.a_number, "A-Number is required");
        require(&mut errors, "first_name", &self.first_name, "First name is required");
        require(&mut errors, "last_name", &self.last_name, "Last name is required");
        errors.into_result()
    }
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        require(&mut errors, "Title", &self.title, "Title is required");
        require(&mut errors, "Description", &self.description, "Description is required");
        if let Some(amount) = self.funding_needs.as_deref() {
            if !is_funding_amount(amount.trim()) {
                errors.add("FundingNeeds", "Funding needs must be a valid amount");
            }
        }
        errors.into_result()
    }
}

fn require(errors: &mut ValidationError, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn check_email(errors: &mut ValidationError, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL_RE.is_match(email) {
        errors.add("email", "Email is invalid");
    }
}

fn check_password(errors: &mut ValidationError, password: &str) {
    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", "Password must be at least 6 characters");
    }
}

fn is_funding_amount(amount: &str) -> bool {
    let Ok(value) = Decimal::from_str(amount) else {
        return false;
    };
    let max_whole = Decimal::from(10u64.pow(FUNDING_MAX_DIGITS - FUNDING_DECIMAL_PLACES));
    !value.is_sign_negative() && value.scale() <= FUNDING_DECIMAL_PLACES && value < max_whole
}
