pub mod alert;
pub mod notification_log;
pub mod notification_preference;
pub mod reading;
