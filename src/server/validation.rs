use crate::error::{Error, FieldViolation, Result};

const MAX_NAME_LEN: usize = 60;
const MAX_ADDRESS_LEN: usize = 400;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

pub fn check_name(violations: &mut Vec<FieldViolation>, name: &str) {
    if name.trim().is_empty() {
        violations.push(FieldViolation::new("name", "name cannot be empty"));
    } else if name.len() > MAX_NAME_LEN {
        violations.push(FieldViolation::new(
            "name",
            format!("name cannot exceed {MAX_NAME_LEN} characters"),
        ));
    }
}

pub fn check_email(violations: &mut Vec<FieldViolation>, email: &str) {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

    if !well_formed || email.len() > MAX_EMAIL_LEN {
        violations.push(FieldViolation::new("email", "email address is not valid"));
    }
}

pub fn check_address(violations: &mut Vec<FieldViolation>, address: &str) {
    if address.len() > MAX_ADDRESS_LEN {
        violations.push(FieldViolation::new(
            "address",
            format!("address cannot exceed {MAX_ADDRESS_LEN} characters"),
        ));
    }
}

/// Password acceptance predicate. Deployments wanting stricter complexity
/// rules change only this function.
pub fn check_password(violations: &mut Vec<FieldViolation>, password: &str) {
    if password.len() < MIN_PASSWORD_LEN {
        violations.push(FieldViolation::new(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    } else if password.len() > MAX_PASSWORD_LEN {
        violations.push(FieldViolation::new(
            "password",
            format!("password cannot exceed {MAX_PASSWORD_LEN} characters"),
        ));
    }
}

pub fn finish(violations: Vec<FieldViolation>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(violations: &[FieldViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_valid_input_passes() {
        let mut v = Vec::new();
        check_name(&mut v, "Alice Example");
        check_email(&mut v, "alice@example.com");
        check_address(&mut v, "1 Main St");
        check_password(&mut v, "long enough");
        assert!(finish(v).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut v = Vec::new();
        check_name(&mut v, "   ");
        assert_eq!(fields(&v), ["name"]);
    }

    #[test]
    fn test_bad_emails_rejected() {
        for email in ["", "no-at-sign", "@example.com", "alice@localhost"] {
            let mut v = Vec::new();
            check_email(&mut v, email);
            assert_eq!(fields(&v), ["email"], "expected rejection for {email:?}");
        }
    }

    #[test]
    fn test_short_password_rejected() {
        let mut v = Vec::new();
        check_password(&mut v, "short");
        assert_eq!(fields(&v), ["password"]);
    }

    #[test]
    fn test_violations_accumulate() {
        let mut v = Vec::new();
        check_name(&mut v, "");
        check_email(&mut v, "nope");
        check_password(&mut v, "x");
        assert_eq!(fields(&v), ["name", "email", "password"]);
        assert!(finish(v).is_err());
    }
}
