/// Errors that can occur within the notification subsystem.
///
/// None of these escape the outbox worker: a failed delivery is logged and
/// recorded, never returned to the code that persisted the alert.
///
/// # Examples
///
/// ```rust
/// use vitalmon_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidConfig("missing smtp host".to_string());
/// assert!(err.to_string().contains("smtp host"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Transport configuration is missing a required field or contains an invalid value.
    #[error("Notify: invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// SMTP transport error when sending email.
    #[error("Notify: SMTP error: {0}")]
    Smtp(String),

    /// A sender or recipient address could not be parsed.
    #[error("Notify: invalid address: {0}")]
    Address(String),

    /// The email message could not be built.
    #[error("Notify: message build error: {0}")]
    Message(String),

    /// Rendering a notification template failed.
    #[error("Notify: template rendering error: {0}")]
    Template(String),

    /// The subject's preferences could not be loaded.
    #[error("Notify: preferences unavailable: {0}")]
    Preferences(String),

    /// A delivery record could not be written.
    #[error("Notify: delivery log error: {0}")]
    Log(String),
}

impl From<lettre::address::AddressError> for NotifyError {
    fn from(e: lettre::address::AddressError) -> Self {
        NotifyError::Address(e.to_string())
    }
}

impl From<lettre::error::Error> for NotifyError {
    fn from(e: lettre::error::Error) -> Self {
        NotifyError::Message(e.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotifyError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        NotifyError::Smtp(e.to_string())
    }
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
