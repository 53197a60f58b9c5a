use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

use crate::database::collection::Collection;
use crate::database::store::StoreError;

pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

pub use bootcamp::{Bootcamp, BootcampInput};
pub use course::{Course, CourseInput};
pub use review::{Review, ReviewInput};
pub use user::{LoginInput, RegisterInput, User};

/// A typed document living in one collection
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static Collection;
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&/=]*)$")
        .expect("url pattern compiles")
});

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_http_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

/// Collects field messages so a request reports every problem at once.
/// With `partial` set, absent fields are not treated as missing.
pub struct Validation {
    partial: bool,
    messages: Vec<String>,
}

impl Validation {
    pub fn full() -> Self {
        Self { partial: false, messages: vec![] }
    }

    pub fn partial() -> Self {
        Self { partial: true, messages: vec![] }
    }

    pub fn for_update(update: bool) -> Self {
        if update { Self::partial() } else { Self::full() }
    }

    pub fn check(&mut self, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.messages.push(message.to_string());
        }
        self
    }

    /// Present and not blank
    pub fn required_text(&mut self, value: &Option<String>, message: &str) -> &mut Self {
        let ok = match value {
            Some(text) => !text.trim().is_empty(),
            None => self.partial,
        };
        self.check(ok, message)
    }

    pub fn required<T>(&mut self, value: &Option<T>, message: &str) -> &mut Self {
        let ok = value.is_some() || self.partial;
        self.check(ok, message)
    }

    pub fn finish(&mut self) -> Result<(), StoreError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(std::mem::take(&mut self.messages)))
        }
    }
}

/// Trimmed copy of an optional text field
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}
