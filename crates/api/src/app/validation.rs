//! Request-body validation at the HTTP boundary.
//!
//! Every check collects into a list of [`FieldError`]s so one response can
//! report all problems at once.

use keygate_core::Email;

use crate::app::dto::{
    ChangePasswordRequest, FieldError, LoginRequest, SignupRequest, UpdateProfileRequest,
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_FULL_NAME_LEN: usize = 2;

const INVALID_EMAIL: &str = "Please provide a valid email address";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters long";
const PASSWORD_TOO_SIMPLE: &str =
    "Password must contain at least one uppercase letter, one lowercase letter, and one number";
const FULL_NAME_TOO_SHORT: &str = "Full name must be at least 2 characters long";
const FULL_NAME_CHARSET: &str = "Full name can only contain letters and spaces";

/// Validated signup input.
#[derive(Debug)]
pub struct Signup {
    pub email: Email,
    pub password: String,
    pub full_name: String,
}

/// Validated login input.
#[derive(Debug)]
pub struct Login {
    pub email: Email,
    pub password: String,
}

/// Validated profile update. Both fields may still be absent; the service
/// decides what an empty update means.
#[derive(Debug)]
pub struct ProfileChanges {
    pub email: Option<Email>,
    pub full_name: Option<String>,
}

/// Strength rule for new secrets. Returns every rule the secret breaks.
pub fn password_policy(password: &str) -> Result<(), Vec<&'static str>> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(PASSWORD_TOO_SHORT);
    }

    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if !(upper && lower && digit) {
        problems.push(PASSWORD_TOO_SIMPLE);
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

fn check_email(raw: &str, errors: &mut Vec<FieldError>) -> Option<Email> {
    match Email::parse(raw) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.push(FieldError::new("email", INVALID_EMAIL));
            None
        }
    }
}

fn check_password(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) {
    if let Err(problems) = password_policy(raw) {
        errors.extend(problems.into_iter().map(|m| FieldError::new(field, m)));
    }
}

fn check_full_name(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let name = raw.trim();
    let before = errors.len();

    if name.chars().count() < MIN_FULL_NAME_LEN {
        errors.push(FieldError::new("fullName", FULL_NAME_TOO_SHORT));
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        errors.push(FieldError::new("fullName", FULL_NAME_CHARSET));
    }

    (errors.len() == before).then(|| name.to_string())
}

fn finish<T>(value: Option<T>, errors: Vec<FieldError>) -> Result<T, Vec<FieldError>> {
    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(errors),
    }
}

pub fn signup(req: SignupRequest) -> Result<Signup, Vec<FieldError>> {
    let mut errors = Vec::new();
    let email = check_email(&req.email, &mut errors);
    check_password("password", &req.password, &mut errors);
    let full_name = check_full_name(&req.full_name, &mut errors);

    let value = email.zip(full_name).map(|(email, full_name)| Signup {
        email,
        password: req.password,
        full_name,
    });
    finish(value, errors)
}

pub fn login(req: LoginRequest) -> Result<Login, Vec<FieldError>> {
    let mut errors = Vec::new();
    let email = check_email(&req.email, &mut errors);
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }

    let value = email.map(|email| Login {
        email,
        password: req.password,
    });
    finish(value, errors)
}

pub fn update_profile(req: UpdateProfileRequest) -> Result<ProfileChanges, Vec<FieldError>> {
    let mut errors = Vec::new();
    let email = req.email.as_deref().map(|raw| check_email(raw, &mut errors));
    let full_name = req
        .full_name
        .as_deref()
        .map(|raw| check_full_name(raw, &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ProfileChanges {
        email: email.flatten(),
        full_name: full_name.flatten(),
    })
}

pub fn change_password(req: &ChangePasswordRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if req.current_password.is_empty() {
        errors.push(FieldError::new("currentPassword", "Current password is required"));
    }
    check_password("newPassword", &req.new_password, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_req(email: &str, password: &str, full_name: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        }
    }

    #[test]
    fn password_policy_reports_each_broken_rule() {
        assert!(password_policy("Test1234").is_ok());
        assert_eq!(password_policy("Ab1").unwrap_err(), vec![PASSWORD_TOO_SHORT]);
        assert_eq!(password_policy("alllowercase1").unwrap_err(), vec![PASSWORD_TOO_SIMPLE]);
        assert_eq!(password_policy("short").unwrap_err().len(), 2);
    }

    #[test]
    fn signup_normalizes_email_and_trims_name() {
        let ok = signup(signup_req(" Test@Example.COM ", "Test1234", "  Test User ")).unwrap();
        assert_eq!(ok.email.as_str(), "test@example.com");
        assert_eq!(ok.full_name, "Test User");
    }

    #[test]
    fn signup_collects_all_field_errors() {
        let errors = signup(signup_req("invalid-email", "weak", "J0")).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"fullName"));
    }

    #[test]
    fn profile_update_allows_absent_fields() {
        let empty = update_profile(UpdateProfileRequest {
            email: None,
            full_name: None,
        })
        .unwrap();
        assert!(empty.email.is_none() && empty.full_name.is_none());

        let bad = update_profile(UpdateProfileRequest {
            email: Some("nope".to_string()),
            full_name: None,
        })
        .unwrap_err();
        assert_eq!(bad[0].field, "email");
    }

    #[test]
    fn change_password_requires_current_and_strong_new() {
        let req = ChangePasswordRequest {
            current_password: String::new(),
            new_password: "weak".to_string(),
        };
        let fields: Vec<_> = change_password(&req).unwrap_err().iter().map(|e| e.field).collect();
        assert!(fields.contains(&"currentPassword"));
        assert!(fields.contains(&"newPassword"));
    }
}
