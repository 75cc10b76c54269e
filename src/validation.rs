//! Client-side validation of the login and signup forms
//!
//! Every field of a form is checked and every failing field is reported,
//! each with the message shown next to it.

use crate::error::{GrowthError, Result};
use regex::Regex;
use std::fmt;

/// Form field a validation message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LoginIdentifier,
    LoginPassword,
    SignupEmail,
    SignupUsername,
    SignupPassword,
    ConfirmPassword,
    AgreeTerms,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoginIdentifier => "Email or username",
            Self::LoginPassword | Self::SignupPassword => "Password",
            Self::SignupEmail => "Email",
            Self::SignupUsername => "Username",
            Self::ConfirmPassword => "Confirm password",
            Self::AgreeTerms => "Terms",
        };
        write!(f, "{}", name)
    }
}

/// A single failing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// All failing fields of one form submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for `field`, if it failed
    pub fn message_for(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    fn check(&mut self, field: Field, outcome: Option<&'static str>) {
        if let Some(message) = outcome {
            self.0.push(FieldError { field, message });
        }
    }

    fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for ValidationErrors {}

/// Login form input
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    /// Email address or username
    pub identifier: String,
    pub password: String,
    pub remember_me: bool,
}

/// Signup form input
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_terms: bool,
}

/// Validator holding the compiled field patterns
#[derive(Debug, Clone)]
pub struct FormValidator {
    email: Regex,
    username: Regex,
}

impl FormValidator {
    pub fn new() -> Result<Self> {
        let email = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .map_err(|e| GrowthError::Validation(format!("Invalid email pattern: {}", e)))?;
        let username = Regex::new(r"^[a-zA-Z0-9_]+$")
            .map_err(|e| GrowthError::Validation(format!("Invalid username pattern: {}", e)))?;
        Ok(Self { email, username })
    }

    pub fn login_identifier(&self, identifier: &str) -> Option<&'static str> {
        if identifier.trim().is_empty() {
            return Some("Email or username is required");
        }
        None
    }

    pub fn login_password(&self, password: &str) -> Option<&'static str> {
        if password.is_empty() {
            return Some("Password is required");
        }
        None
    }

    pub fn signup_email(&self, email: &str) -> Option<&'static str> {
        let email = email.trim();
        if email.is_empty() {
            return Some("Email address is required");
        }
        if !self.email.is_match(email) {
            return Some("Please enter a valid email address");
        }
        None
    }

    pub fn signup_username(&self, username: &str) -> Option<&'static str> {
        let username = username.trim();
        if username.is_empty() {
            return Some("Username is required");
        }
        if username.chars().count() < 3 {
            return Some("Username must be at least 3 characters");
        }
        if !self.username.is_match(username) {
            return Some("Username can only contain letters, numbers, and underscores");
        }
        None
    }

    pub fn signup_password(&self, password: &str) -> Option<&'static str> {
        if password.is_empty() {
            return Some("Password is required");
        }
        if password.chars().count() < 8 {
            return Some("Password must be at least 8 characters");
        }
        let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !has_lower || !has_upper || !has_digit {
            return Some("Password must contain uppercase, lowercase, and number");
        }
        None
    }

    pub fn confirm_password(&self, password: &str, confirm: &str) -> Option<&'static str> {
        if confirm.is_empty() {
            return Some("Please confirm your password");
        }
        if password != confirm {
            return Some("Passwords do not match");
        }
        None
    }

    pub fn terms(&self, agreed: bool) -> Option<&'static str> {
        if !agreed {
            return Some("Please agree to the Terms of Service and Privacy Policy");
        }
        None
    }

    /// Validate every login field
    pub fn validate_login(&self, form: &LoginForm) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(Field::LoginIdentifier, self.login_identifier(&form.identifier));
        errors.check(Field::LoginPassword, self.login_password(&form.password));
        errors.into_result()
    }

    /// Validate every signup field
    pub fn validate_signup(&self, form: &SignupForm) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(Field::SignupEmail, self.signup_email(&form.email));
        errors.check(Field::SignupUsername, self.signup_username(&form.username));
        errors.check(Field::SignupPassword, self.signup_password(&form.password));
        errors.check(
            Field::ConfirmPassword,
            self.confirm_password(&form.password, &form.confirm_password),
        );
        errors.check(Field::AgreeTerms, self.terms(form.agree_terms));
        errors.into_result()
    }
}
