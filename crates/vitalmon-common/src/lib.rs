pub mod fingerprint;
pub mod id;
pub mod types;
