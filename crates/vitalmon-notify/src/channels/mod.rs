pub mod smtp;

pub use smtp::{SmtpSettings, SmtpTransport};
