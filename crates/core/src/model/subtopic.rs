use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::model::ids::{OwnerId, SubtopicId, TopicId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image reference cannot be empty")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubtopicError {
    #[error("subtopic title cannot be empty")]
    EmptyTitle,

    #[error("invalid image reference: {0}")]
    Image(#[from] ImageRefError),
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Reference to a subtopic's image: a local file or a remote URL.
///
/// Persisted as plain text; `parse` reverses `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    FilePath(PathBuf),
    Url(Url),
}

impl ImageRef {
    /// Builds an `ImageRef` from a local file path.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` if the path is empty.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ImageRefError> {
        let p = path.into();
        if p.as_os_str().is_empty() {
            return Err(ImageRefError::Empty);
        }
        Ok(ImageRef::FilePath(p))
    }

    /// Builds an `ImageRef` from a URL string.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` if the string is empty or not a URL.
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, ImageRefError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }
        let u = Url::parse(s).map_err(|_| ImageRefError::Empty)?;
        Ok(ImageRef::Url(u))
    }

    /// Restores an `ImageRef` from its persisted text form.
    ///
    /// Strings that parse as an http(s) URL become `Url`; everything else is
    /// treated as a file path.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` if the string is empty.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ImageRefError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }
        match Url::parse(s) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(ImageRef::Url(u)),
            _ => Ok(ImageRef::FilePath(PathBuf::from(s))),
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ImageRef::FilePath(p) => Some(p.as_path()),
            ImageRef::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            ImageRef::Url(u) => Some(u),
            ImageRef::FilePath(_) => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::FilePath(p) => write!(f, "{}", p.display()),
            ImageRef::Url(u) => write!(f, "{u}"),
        }
    }
}

//
// ─── SUBTOPIC ──────────────────────────────────────────────────────────────────
//

/// A single flashcard-like item belonging to exactly one topic.
///
/// `checked` marks the subtopic as known/complete; `bookmarked` flags it for
/// review independently of the checked state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtopic {
    id: SubtopicId,
    topic_id: TopicId,
    owner_id: Option<OwnerId>,
    title: String,
    description: String,
    checked: bool,
    bookmarked: bool,
    image: Option<ImageRef>,
    created_at: DateTime<Utc>,
}

impl Subtopic {
    /// Creates a fresh subtopic with both flags cleared.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicError::EmptyTitle` if the title is empty or
    /// whitespace-only. The description is trimmed and may be empty.
    pub fn new(
        id: SubtopicId,
        topic_id: TopicId,
        owner_id: Option<OwnerId>,
        title: impl Into<String>,
        description: impl Into<String>,
        image: Option<ImageRef>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SubtopicError> {
        Self::from_persisted(
            id, topic_id, owner_id, title, description, false, false, image, created_at,
        )
    }

    /// Restores a subtopic from persisted state.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SubtopicId,
        topic_id: TopicId,
        owner_id: Option<OwnerId>,
        title: impl Into<String>,
        description: impl Into<String>,
        checked: bool,
        bookmarked: bool,
        image: Option<ImageRef>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SubtopicError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SubtopicError::EmptyTitle);
        }
        let description = description.into().trim().to_owned();

        Ok(Self {
            id,
            topic_id,
            owner_id,
            title: title.trim().to_owned(),
            description,
            checked,
            bookmarked,
            image,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> SubtopicId {
        self.id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn checked(&self) -> bool {
        self.checked
    }

    #[must_use]
    pub fn bookmarked(&self) -> bool {
        self.bookmarked
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // Flag mutators, used by the in-memory store and update flows.
    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    pub fn set_bookmarked(&mut self, bookmarked: bool) {
        self.bookmarked = bookmarked;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build(title: &str, description: &str) -> Result<Subtopic, SubtopicError> {
        Subtopic::new(
            SubtopicId::new(1),
            TopicId::new(1),
            None,
            title,
            description,
            None,
            fixed_now(),
        )
    }

    #[test]
    fn subtopic_rejects_empty_title() {
        let err = build("  ", "desc").unwrap_err();
        assert_eq!(err, SubtopicError::EmptyTitle);
    }

    #[test]
    fn subtopic_allows_empty_description() {
        let sub = build("What is a terrier?", "   ").unwrap();
        assert_eq!(sub.description(), "");
    }

    #[test]
    fn subtopic_starts_unchecked_and_unbookmarked() {
        let sub = build("Q", "A").unwrap();
        assert!(!sub.checked());
        assert!(!sub.bookmarked());
    }

    #[test]
    fn subtopic_flag_mutators() {
        let mut sub = build("Q", "A").unwrap();
        sub.set_checked(true);
        sub.set_bookmarked(true);
        assert!(sub.checked());
        assert!(sub.bookmarked());
    }

    #[test]
    fn image_ref_from_url_and_back() {
        let img = ImageRef::from_url("https://example.com/dog.png").unwrap();
        assert!(img.as_url().is_some());
        assert_eq!(
            ImageRef::parse(img.to_string()).unwrap(),
            ImageRef::from_url("https://example.com/dog.png").unwrap()
        );
    }

    #[test]
    fn image_ref_parse_falls_back_to_path() {
        let img = ImageRef::parse("images/dog.png").unwrap();
        assert_eq!(img.as_path(), Some(Path::new("images/dog.png")));
    }

    #[test]
    fn image_ref_rejects_empty() {
        assert_eq!(ImageRef::parse("  ").unwrap_err(), ImageRefError::Empty);
        assert_eq!(ImageRef::from_file("").unwrap_err(), ImageRefError::Empty);
    }
}
