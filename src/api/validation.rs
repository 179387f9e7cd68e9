use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

use super::ApiError;
use crate::services::{CreateUserRequest, PartialUpdateUserRequest, UpdateUserRequest};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
    })
}

pub fn validate_idempotency_key(key: &str) -> Result<(), ApiError> {
    if !(4..=50).contains(&key.len()) {
        return Err(ApiError::validation(
            "Idempotency key must be between 4 and 50 characters",
        ));
    }
    Ok(())
}

pub fn validate_user_name(name: &str) -> Result<(), ApiError> {
    if !(4..=50).contains(&name.len()) {
        return Err(ApiError::validation(
            "User name must be between 4 and 50 characters",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.len() > 50 || !email_regex().is_match(email) {
        return Err(ApiError::validation(format!(
            "Invalid email address: {}",
            email
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if !(4..=255).contains(&password.len()) {
        return Err(ApiError::validation(
            "Password must be between 4 and 255 characters",
        ));
    }
    Ok(())
}

pub fn validate_date_of_birth(date: NaiveDate) -> Result<(), ApiError> {
    if date >= Utc::now().date_naive() {
        return Err(ApiError::validation("Date of birth must be in the past"));
    }
    Ok(())
}

pub fn validate_date_of_leaving(date: NaiveDate) -> Result<(), ApiError> {
    if date <= Utc::now().date_naive() {
        return Err(ApiError::validation("Date of leaving must be in the future"));
    }
    Ok(())
}

pub fn validate_postal_code(code: i32) -> Result<(), ApiError> {
    if !(1..=99999).contains(&code) {
        return Err(ApiError::validation(format!(
            "Invalid postal code: {}. Must be positive with at most 5 digits",
            code
        )));
    }
    Ok(())
}

pub fn validate_create_user(request: &CreateUserRequest) -> Result<(), ApiError> {
    validate_idempotency_key(&request.idempotency_key)?;
    validate_user_name(&request.user_name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_date_of_birth(request.date_of_birth)?;
    validate_date_of_leaving(request.date_of_leaving)?;
    validate_postal_code(request.postal_code)?;
    Ok(())
}

pub fn validate_update_user(request: &UpdateUserRequest) -> Result<(), ApiError> {
    validate_user_name(&request.user_name)?;
    validate_email(&request.email)?;
    if !request.password.trim().is_empty() {
        validate_password(&request.password)?;
    }
    validate_date_of_birth(request.date_of_birth)?;
    validate_date_of_leaving(request.date_of_leaving)?;
    validate_postal_code(request.postal_code)?;
    Ok(())
}

pub fn validate_partial_update_user(request: &PartialUpdateUserRequest) -> Result<(), ApiError> {
    if let Some(name) = &request.user_name {
        validate_user_name(name)?;
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }
    if let Some(password) = &request.password {
        if !password.trim().is_empty() {
            validate_password(password)?;
        }
    }
    if let Some(date) = request.date_of_birth {
        validate_date_of_birth(date)?;
    }
    if let Some(date) = request.date_of_leaving {
        validate_date_of_leaving(date)?;
    }
    if let Some(code) = request.postal_code {
        validate_postal_code(code)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_name() {
        assert!(validate_user_name("jdoe").is_ok());
        assert!(validate_user_name(&"a".repeat(50)).is_ok());
        assert!(validate_user_name("abc").is_err());
        assert!(validate_user_name(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jdoe@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        let long = format!("{}@example.com", "a".repeat(45));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("hunter2!").is_ok());
        assert!(validate_password("abc").is_err());
        assert!(validate_password(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_dates() {
        let past = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let future = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();
        assert!(validate_date_of_birth(past).is_ok());
        assert!(validate_date_of_birth(future).is_err());
        assert!(validate_date_of_leaving(future).is_ok());
        assert!(validate_date_of_leaving(past).is_err());
    }

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code(1).is_ok());
        assert!(validate_postal_code(99999).is_ok());
        assert!(validate_postal_code(0).is_err());
        assert!(validate_postal_code(-10).is_err());
        assert!(validate_postal_code(100000).is_err());
    }
}
