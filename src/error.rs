use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all required fields.")]
    MissingField(&'static str),

    #[error("Please enter a valid email address.")]
    MalformedEmail,

    #[error("Please enter a valid phone number (10-15 digits).")]
    MalformedContactNumber,
}

#[derive(Error, Debug)]
pub enum WaitlistError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("This email is already on the waitlist!")]
    Duplicate,

    #[error("Something went wrong. Please try again.")]
    Transient(#[source] anyhow::Error),
}
