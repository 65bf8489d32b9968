//! # Credential resolver (C5)
//!
//! [`CredentialResolver`] walks the password sources in the order implied
//! by [`archive_domain::PasswordMode`]; [`password_list`] is the
//! process-wide cache of previously-accepted passwords it consults first.

mod password_list;
mod resolver;

pub use resolver::{CredentialResolver, PromptFn};
