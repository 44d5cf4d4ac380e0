//! The contact form.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AccountError;

const SENT_MESSAGE: &str = "Your message has been sent successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    /// Only the email is checked; name and message may be any text.
    pub fn validate(&self) -> Result<(), AccountError> {
        if !is_valid_email(self.email.trim()) {
            return Err(AccountError::InvalidForm(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub success: bool,
    pub message: String,
}

fn is_valid_email(email: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("Invalid email regex")
    });
    re.is_match(email)
}

/// Validate and record a contact submission.
pub fn submit_contact_form(form: &ContactForm) -> Result<ContactReceipt, AccountError> {
    form.validate()?;
    info!(
        name = %form.name.trim(),
        email = %form.email.trim(),
        message_len = form.message.len(),
        "Contact form submitted"
    );
    Ok(ContactReceipt {
        success: true,
        message: SENT_MESSAGE.to_string(),
    })
}
