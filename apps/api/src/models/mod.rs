pub mod profile;
pub mod request;
pub mod sent_email;
