pub mod notify;
pub mod source;
