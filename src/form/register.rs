//! Sign-up form with country dial code

use super::Form;
use crate::feature::auth::register::MIN_PASSWORD_LENGTH;

pub const DEFAULT_DIAL_CODE: &str = "+62";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDetails {
    pub name: String,
    pub email: String,
    /// Dial code followed by the subscriber number
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub dial_code: String,
    /// Starts out as the bare dial code
    pub phone: String,
    pub password: String,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self::new(DEFAULT_DIAL_CODE)
    }
}

impl RegisterForm {
    pub fn new(dial_code: &str) -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            dial_code: dial_code.to_string(),
            phone: dial_code.to_string(),
            password: String::new(),
        }
    }

    /// Swap the country prefix, keeping the digits typed after it
    pub fn set_dial_code(&mut self, dial_code: &str) {
        let number = self
            .phone
            .strip_prefix(self.dial_code.as_str())
            .unwrap_or(&self.phone)
            .to_string();
        self.dial_code = dial_code.to_string();
        self.phone = format!("{}{}", dial_code, number);
    }
}

impl Form for RegisterForm {
    type Request = RegistrationDetails;

    fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.trim().is_empty()
        {
            return Some("Please fill in all fields");
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Some("Password must be at least 6 characters");
        }
        if self.phone.trim().len() <= self.dial_code.len() {
            return Some("Please enter your phone number");
        }
        None
    }

    fn build(&self) -> Option<RegistrationDetails> {
        Some(RegistrationDetails {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegisterForm {
        RegisterForm {
            name: "Ann".to_string(),
            email: "ann@b.com".to_string(),
            phone: "+628123456".to_string(),
            password: "secret1".to_string(),
            ..RegisterForm::default()
        }
    }

    #[test]
    fn test_phone_must_extend_dial_code() {
        let mut form = filled();
        assert!(form.is_valid());

        form.phone = "+62".to_string();
        assert!(!form.is_valid());
        assert_eq!(form.validation_error(), Some("Please enter your phone number"));
        assert!(form.submit().is_none());
    }

    #[test]
    fn test_short_password() {
        let mut form = filled();
        form.password = "abc".to_string();
        assert_eq!(form.validation_error(), Some("Password must be at least 6 characters"));
    }

    #[test]
    fn test_whitespace_password_is_blank() {
        let mut form = filled();
        form.password = "       ".to_string();
        assert_eq!(form.validation_error(), Some("Please fill in all fields"));
        assert!(form.submit().is_none());
    }

    #[test]
    fn test_set_dial_code_keeps_number() {
        let mut form = filled();
        form.set_dial_code("+65");
        assert_eq!(form.phone, "+658123456");
        assert_eq!(form.submit().unwrap().phone, "+658123456");
    }
}
