//! Outgoing mail: the transport port, message templates, and the service
//! that sends chat exports and discussion requests.

pub mod mailer;
pub mod service;
pub mod templates;
