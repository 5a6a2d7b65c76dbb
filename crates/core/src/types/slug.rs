//! URL slug type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[-a-zA-Z0-9_]`.
    #[error("slug contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A URL-safe text identifier for a category or product.
///
/// ## Constraints
///
/// - Length: 1-50 characters
/// - Only ASCII letters, digits, hyphens and underscores
///
/// ## Examples
///
/// ```
/// use catalog_core::Slug;
///
/// assert!(Slug::parse("green-tea").is_ok());
/// assert!(Slug::parse("tea_2024").is_ok());
///
/// assert!(Slug::parse("").is_err());
/// assert!(Slug::parse("green tea").is_err());
/// assert!(Slug::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a `Slug` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than
    /// [`Slug::MAX_LENGTH`], or contains characters other than ASCII
    /// letters, digits, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(SlugError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Lowercases ASCII letters, collapses every run of other characters into
    /// a single hyphen and trims hyphens from both ends.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` if the name has no ASCII alphanumerics.
    ///
    /// ```
    /// use catalog_core::Slug;
    ///
    /// let slug = Slug::slugify("Green Tea (Loose Leaf)").unwrap();
    /// assert_eq!(slug.as_str(), "green-tea-loose-leaf");
    /// ```
    pub fn slugify(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        }
        while out.ends_with('-') {
            out.pop();
        }
        out.truncate(Self::MAX_LENGTH);
        while out.ends_with('-') {
            out.pop();
        }
        Self::parse(&out)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
