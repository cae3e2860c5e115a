//! Holder for the `Authorization` header value.
//!
//! The dispatcher reads the holder on every call, so replacing its contents
//! after a session expires affects the next request and nothing else.

use std::fmt;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    value: Option<String>,
}

impl Credential {
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }

    pub fn get(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Replace the held value, returning the old one.
    pub fn replace(&mut self, value: impl Into<String>) -> Option<String> {
        self.value.replace(value.into())
    }
}

// Never print the secret itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.value.is_some() { "<redacted>" } else { "<none>" };
        f.debug_tuple("Credential").field(&shown).finish()
    }
}
