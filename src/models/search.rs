//! Search request, hint and candidate models.

use serde::{Deserialize, Serialize};

use crate::models::BookRecord;

/// Optional filters narrowing a free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHints {
    pub publisher: Option<String>,
    pub subject: Option<String>,
    pub place: Option<String>,
    pub year: Option<String>,
    pub language: Option<String>,
}

impl SearchHints {
    /// Create empty hints
    pub fn new() -> Self {
        Self::default()
    }

    /// Set publisher hint
    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Set subject hint
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set place hint
    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    /// Set year hint
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Set language hint
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Combine with hints parsed from the query text; parsed values win.
    pub fn overlay(&self, parsed: &SearchHints) -> SearchHints {
        SearchHints {
            publisher: parsed.publisher.clone().or_else(|| self.publisher.clone()),
            subject: parsed.subject.clone().or_else(|| self.subject.clone()),
            place: parsed.place.clone().or_else(|| self.place.clone()),
            year: parsed.year.clone().or_else(|| self.year.clone()),
            language: parsed.language.clone().or_else(|| self.language.clone()),
        }
    }

    /// Whether no hint is set
    pub fn is_empty(&self) -> bool {
        self.publisher.is_none()
            && self.subject.is_none()
            && self.place.is_none()
            && self.year.is_none()
            && self.language.is_none()
    }
}

/// Structured form of a free-text query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub subject: Option<String>,
    pub place: Option<String>,
    pub year: Option<String>,
    pub language: Option<String>,
}

impl ParsedQuery {
    /// The field hints found in the query text
    pub fn hints(&self) -> SearchHints {
        SearchHints {
            publisher: self.publisher.clone(),
            subject: self.subject.clone(),
            place: self.place.clone(),
            year: self.year.clone(),
            language: self.language.clone(),
        }
    }
}

/// Parameters for one bulk search against a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub title: String,
    pub author: Option<String>,
    /// Maximum number of candidates the provider should return
    pub limit: usize,
    pub hints: SearchHints,
}

impl SearchRequest {
    /// Create a request for `title`
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            limit: 40,
            hints: SearchHints::default(),
        }
    }

    /// Set author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set candidate limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set hints
    pub fn hints(mut self, hints: SearchHints) -> Self {
        self.hints = hints;
        self
    }
}

/// One search hit before aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub record: BookRecord,
    /// Provider-internal id, used to key identifier-less candidates
    pub source_id: Option<String>,
    /// Handle of the work this edition belongs to
    pub work_key: Option<String>,
}

impl Candidate {
    /// Wrap a record
    pub fn new(record: BookRecord) -> Self {
        let work_key = record.work_key.clone();
        Self {
            record,
            source_id: None,
            work_key,
        }
    }

    /// Set the provider-internal id
    pub fn source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    /// Set the work key
    pub fn work_key(mut self, key: impl Into<String>) -> Self {
        self.work_key = Some(key.into());
        self
    }

    /// Keys this candidate is deduplicated by; empty without an ISBN
    pub fn identifiers(&self) -> Vec<String> {
        self.record.identifier_keys()
    }
}
