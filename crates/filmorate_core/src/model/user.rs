//! User domain model.
//!
//! # Invariants
//! - `name` is never blank once stored; it falls back to `login`.
//! - `friends` is the target set of the directed friendship relation owned by
//!   this user. It says nothing about who lists this user as a friend.

use super::{provided_text, UserId};
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("valid ws regex"));

/// User invariant violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    BlankEmail,
    EmailWithoutAt,
    BlankLogin,
    LoginWithWhitespace,
    BirthdayInFuture(NaiveDate),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankEmail => write!(f, "user email must not be blank"),
            Self::EmailWithoutAt => write!(f, "user email must contain `@`"),
            Self::BlankLogin => write!(f, "user login must not be blank"),
            Self::LoginWithWhitespace => write!(f, "user login must not contain whitespace"),
            Self::BirthdayInFuture(date) => write!(f, "birthday {date} is in the future"),
        }
    }
}

impl Error for UserValidationError {}

/// Hydrated user aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub friends: BTreeSet<UserId>,
}

impl User {
    /// Creates an unsaved user with no friends.
    pub fn new(
        email: impl Into<String>,
        login: impl Into<String>,
        name: impl Into<String>,
        birthday: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            email: email.into(),
            login: login.into(),
            name: name.into(),
            birthday,
            friends: BTreeSet::new(),
        }
    }

    /// Applies the display-name default: a blank name becomes the login.
    pub fn with_name_fallback(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = self.login.clone();
        }
        self
    }

    /// Checks invariants against today's local date.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        self.validate_at(Local::now().date_naive())
    }

    /// Checks invariants against an explicit "today".
    pub fn validate_at(&self, today: NaiveDate) -> Result<(), UserValidationError> {
        if self.email.trim().is_empty() {
            return Err(UserValidationError::BlankEmail);
        }
        if !self.email.contains('@') {
            return Err(UserValidationError::EmailWithoutAt);
        }
        if self.login.trim().is_empty() {
            return Err(UserValidationError::BlankLogin);
        }
        if WHITESPACE_RE.is_match(&self.login) {
            return Err(UserValidationError::LoginWithWhitespace);
        }
        if self.birthday > today {
            return Err(UserValidationError::BirthdayInFuture(self.birthday));
        }
        Ok(())
    }
}

/// Partial user update; `None` or blank strings keep the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub id: UserId,
    pub email: Option<String>,
    pub login: Option<String>,
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
}

impl UserPatch {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Merges the patch over a stored user. Friends are never touched.
    pub fn apply_to(&self, stored: &User) -> User {
        let mut merged = stored.clone();
        if let Some(email) = provided_text(&self.email) {
            merged.email = email.to_string();
        }
        if let Some(login) = provided_text(&self.login) {
            merged.login = login.to_string();
        }
        if let Some(name) = provided_text(&self.name) {
            merged.name = name.to_string();
        }
        if let Some(birthday) = self.birthday {
            merged.birthday = birthday;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserPatch, UserValidationError};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> User {
        User::new("ann@example.com", "ann", "Ann", date(1990, 1, 1))
    }

    #[test]
    fn blank_name_falls_back_to_login() {
        let user = User::new("a@b.c", "neo", "  ", date(1990, 1, 1)).with_name_fallback();
        assert_eq!(user.name, "neo");

        let named = sample().with_name_fallback();
        assert_eq!(named.name, "Ann");
    }

    #[test]
    fn validate_rejects_broken_fields() {
        let today = date(2024, 6, 1);

        let mut user = sample();
        user.email = "ann.example.com".to_string();
        assert_eq!(
            user.validate_at(today),
            Err(UserValidationError::EmailWithoutAt)
        );

        let mut user = sample();
        user.login = "ann smith".to_string();
        assert_eq!(
            user.validate_at(today),
            Err(UserValidationError::LoginWithWhitespace)
        );

        let mut user = sample();
        user.login = String::new();
        assert_eq!(user.validate_at(today), Err(UserValidationError::BlankLogin));

        let mut user = sample();
        user.birthday = date(2024, 6, 2);
        assert!(matches!(
            user.validate_at(today),
            Err(UserValidationError::BirthdayInFuture(_))
        ));

        let mut user = sample();
        user.birthday = today;
        assert_eq!(user.validate_at(today), Ok(()));
    }

    #[test]
    fn patch_merges_only_provided_fields() {
        let stored = sample();

        let blank = UserPatch {
            name: Some(String::new()),
            ..UserPatch::new(5)
        };
        assert_eq!(blank.apply_to(&stored).name, "Ann");

        let renamed = UserPatch {
            name: Some("Bob".to_string()),
            ..UserPatch::new(5)
        };
        let merged = renamed.apply_to(&stored);
        assert_eq!(merged.name, "Bob");
        assert_eq!(merged.login, "ann");
        assert_eq!(merged.email, "ann@example.com");
    }
}
