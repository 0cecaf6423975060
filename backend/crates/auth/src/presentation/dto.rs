//! Form and View DTOs (Data Transfer Objects)

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{Datelike, Utc};
use kernel::validation::{self, Validator};
use platform::password::{ClearTextPassword, MIN_PASSWORD_LENGTH};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_object::email::Email;

// ============================================================================
// View data
// ============================================================================

/// Data handed to the view renderer
///
/// Rendered as JSON; templates are outside this service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<Value>,
    #[serde(skip_serializing_if = "Validator::valid")]
    pub errors: Validator,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub page: Value,
}

impl TemplateData {
    pub fn new(flash: Option<String>, is_authenticated: bool, csrf_token: Option<String>) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash,
            is_authenticated,
            csrf_token,
            form: None,
            errors: Validator::new(),
            page: Value::Null,
        }
    }

    /// Echo a submitted form with its validation errors
    pub fn with_form(mut self, form: &impl Serialize, errors: Validator) -> Self {
        self.form = serde_json::to_value(form).ok();
        self.errors = errors;
        self
    }

    /// Validation errors without a form echo
    pub fn with_errors(mut self, errors: Validator) -> Self {
        self.errors = errors;
        self
    }

    /// Page-specific payload
    pub fn with_page(mut self, page: impl Serialize) -> Self {
        self.page = serde_json::to_value(page).unwrap_or(Value::Null);
        self
    }

    pub fn render(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

/// Checked sign up fields
pub struct ValidSignUp {
    pub name: String,
    pub email: Email,
    pub password: ClearTextPassword,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<ValidSignUp, Validator> {
        let mut v = Validator::new();

        v.check_field(validation::not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(
            validation::max_chars(&self.name, 255),
            "name",
            "This field cannot be more than 255 characters long",
        );

        let email = Email::new(self.email.as_str())
            .map_err(|e| v.add_field_error("email", e.to_string()))
            .ok();

        let password = ClearTextPassword::new(self.password.clone())
            .map_err(|e| v.add_field_error("password", e.to_string()))
            .ok();

        match (email, password) {
            (Some(email), Some(password)) if v.valid() => Ok(ValidSignUp {
                name: self.name.trim().to_string(),
                email,
                password,
            }),
            _ => Err(v),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// Login form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl LoginForm {
    /// Presence checks only; credentials are judged by the verifier
    pub fn validate(&self) -> Result<(), Validator> {
        let mut v = Validator::new();
        v.check_field(validation::not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            validation::is_email(self.email.trim()),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(
            validation::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        if v.valid() { Ok(()) } else { Err(v) }
    }
}

// ============================================================================
// Password update
// ============================================================================

/// Password update form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordUpdateForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirmation: String,
}

pub struct ValidPasswordUpdate {
    pub current_password: ClearTextPassword,
    pub new_password: ClearTextPassword,
}

impl PasswordUpdateForm {
    pub fn validate(&self) -> Result<ValidPasswordUpdate, Validator> {
        let mut v = Validator::new();

        v.check_field(
            validation::not_blank(&self.current_password),
            "current_password",
            "This field cannot be blank",
        );
        v.check_field(
            validation::min_chars(&self.new_password, MIN_PASSWORD_LENGTH),
            "new_password",
            format!("This field must be at least {MIN_PASSWORD_LENGTH} characters long"),
        );

        let new_password = ClearTextPassword::new(self.new_password.clone())
            .map_err(|e| v.add_field_error("new_password", e.to_string()))
            .ok();

        v.check_field(
            self.new_password == self.new_password_confirmation,
            "new_password_confirmation",
            "Passwords do not match",
        );

        match new_password {
            Some(new_password) if v.valid() => Ok(ValidPasswordUpdate {
                current_password: ClearTextPassword::for_verification(
                    self.current_password.clone(),
                ),
                new_password,
            }),
            _ => Err(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_validation() {
        let form = SignUpForm {
            name: "".to_string(),
            email: "bad".to_string(),
            password: "short".to_string(),
        };
        let errors = form.validate().err().unwrap();
        assert_eq!(errors.field_errors.len(), 3);
        assert_eq!(
            errors.field_errors["password"],
            "This field must be at least 8 characters long"
        );

        let form = SignUpForm {
            name: "Bob".to_string(),
            email: "Bob@Example.com".to_string(),
            password: "correct horse".to_string(),
        };
        let valid = form.validate().ok().unwrap();
        assert_eq!(valid.email.as_str(), "bob@example.com");
    }

    #[test]
    fn test_password_is_never_echoed() {
        let form = SignUpForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        let echoed = serde_json::to_string(&form).unwrap();
        assert!(!echoed.contains("correct horse"));

        let login = LoginForm {
            email: "bob@example.com".to_string(),
            password: "pa$$word".to_string(),
        };
        assert!(!serde_json::to_string(&login).unwrap().contains("pa$$word"));
    }

    #[test]
    fn test_login_validation() {
        assert!(LoginForm {
            email: "alice@example.com".to_string(),
            password: "x".to_string(),
        }
        .validate()
        .is_ok());

        let errors = LoginForm::default().validate().err().unwrap();
        assert!(errors.field_errors.contains_key("email"));
        assert!(errors.field_errors.contains_key("password"));
    }

    #[test]
    fn test_password_update_confirmation() {
        let form = PasswordUpdateForm {
            current_password: "pa$$word".to_string(),
            new_password: "n3w-passphrase".to_string(),
            new_password_confirmation: "different".to_string(),
        };
        let errors = form.validate().err().unwrap();
        assert_eq!(
            errors.field_errors["new_password_confirmation"],
            "Passwords do not match"
        );
    }

    #[test]
    fn test_template_data_skips_empty_parts() {
        let data = TemplateData::new(None, false, Some("tok".to_string()));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["csrfToken"], "tok");

        let data = TemplateData::new(None, false, None);
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("csrfToken").is_none());
        assert_eq!(json["isAuthenticated"], false);
        assert!(json.get("form").is_none());
        assert!(json.get("errors").is_none());
        assert!(json.get("page").is_none());
    }
}
