use crate::error::ValidationError;
use crate::models::NewSignup;

const MIN_CONTACT_DIGITS: usize = 10;
const MAX_CONTACT_DIGITS: usize = 15;

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub phone_country_code: String,
    pub country_code: String,
    pub country_name: String,
    pub city: String,
    pub area: String,
}

pub fn validate(form: &SignupForm) -> Result<NewSignup, ValidationError> {
    let required = [
        ("name", &form.name),
        ("email", &form.email),
        ("country", &form.country_code),
        ("country name", &form.country_name),
        ("city", &form.city),
        ("area", &form.area),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }

    let email = form.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ValidationError::MalformedEmail);
    }

    let contact_number = normalize_contact_number(&form.phone_country_code, &form.contact_number)?;

    Ok(NewSignup {
        name: form.name.trim().to_string(),
        email,
        contact_number,
        country_code: form.country_code.trim().to_string(),
        country_name: form.country_name.trim().to_string(),
        city: form.city.trim().to_string(),
        area: form.area.trim().to_string(),
    })
}

/// Accepts `local@domain.tld`: no whitespace, a single `@`, and a dot in the
/// domain with text on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index + 1 < domain.len())
}

/// Empty input means no number. Anything else must carry 10 to 15 digits once
/// punctuation is stripped, and is stored behind the phone country code.
pub fn normalize_contact_number(
    phone_country_code: &str,
    input: &str,
) -> Result<Option<String>, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if !(MIN_CONTACT_DIGITS..=MAX_CONTACT_DIGITS).contains(&digits.len()) {
        return Err(ValidationError::MalformedContactNumber);
    }

    Ok(Some(format!("{}{digits}", phone_country_code.trim())))
}
