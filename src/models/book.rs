//! Book record model shared by every provider and by the merge engine.

use serde::{Deserialize, Serialize};

/// Borrowed view of one attribute of a [`BookRecord`]
#[derive(Debug, Clone, Copy)]
pub enum FieldSlot<'a> {
    Text(&'a Option<String>),
    Count(&'a Option<u32>),
    List(&'a Option<Vec<String>>),
}

impl FieldSlot<'_> {
    /// Whether the attribute carries a usable value.
    ///
    /// Blank strings, zero counts and empty lists are treated as missing.
    pub fn is_filled(&self) -> bool {
        match *self {
            FieldSlot::Text(v) => v.as_deref().is_some_and(|s| !s.trim().is_empty()),
            FieldSlot::Count(v) => v.is_some_and(|n| n > 0),
            FieldSlot::List(v) => v.as_ref().is_some_and(|l| !l.is_empty()),
        }
    }
}

/// The same attribute borrowed from a destination record (mutably) and a
/// source record, used by the merge engine.
#[derive(Debug)]
pub enum FieldPair<'a> {
    Text(&'a mut Option<String>, &'a Option<String>),
    Count(&'a mut Option<u32>, &'a Option<u32>),
    List(&'a mut Option<Vec<String>>, &'a Option<Vec<String>>),
}

/// A partial book record as returned by a provider or produced by merging.
///
/// Every attribute is independently optional. Providers fill what they know
/// and leave the rest as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Primary author, as displayed
    pub author: Option<String>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub publisher: Option<String>,
    /// Publication date as given by the provider (year, `YYYY-MM` or full date)
    pub published_date: Option<String>,
    pub first_published: Option<String>,
    pub copyright_date: Option<String>,
    pub place_of_publication: Option<String>,
    /// Language code or name
    pub language: Option<String>,
    pub cover_url: Option<String>,
    pub cover_url_large: Option<String>,
    pub description: Option<String>,
    pub edition: Option<String>,
    /// Binding or physical format (hardcover, paperback, ebook, ...)
    pub format: Option<String>,
    pub physical_description: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    /// Library of Congress call number
    pub call_number: Option<String>,
    pub dewey_decimal: Option<String>,
    pub lccn: Option<String>,
    pub oclc_number: Option<String>,
    pub openlibrary_id: Option<String>,
    pub google_books_id: Option<String>,
    pub hathitrust_id: Option<String>,
    /// Handle grouping sibling editions of the same work
    pub work_key: Option<String>,
    pub series: Option<String>,
    pub series_number: Option<String>,
    pub original_title: Option<String>,
    pub translator: Option<String>,
    pub illustrator: Option<String>,
    pub notes: Option<String>,
    pub table_of_contents: Option<String>,
    pub info_url: Option<String>,
    pub preview_url: Option<String>,
    pub maturity_rating: Option<String>,

    pub page_count: Option<u32>,
    pub ratings_count: Option<u32>,
    pub edition_count: Option<u32>,

    /// Every credited person other than the primary author
    pub contributors: Option<Vec<String>>,
    pub subjects: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    /// Classification codes (LCC, DDC, ...)
    pub classifications: Option<Vec<String>>,
    pub places: Option<Vec<String>>,
    pub time_periods: Option<Vec<String>>,
    pub people: Option<Vec<String>>,
    pub other_isbns: Option<Vec<String>>,
    pub alternate_titles: Option<Vec<String>>,
    pub awards: Option<Vec<String>>,

    /// Provenance label: a provider name, or `"Combined"`
    pub source: Option<String>,

    /// Providers that contributed to this record, in contribution order
    #[serde(default)]
    pub data_sources: Vec<String>,
}

macro_rules! book_fields {
    ($( $variant:ident => $field:ident : $kind:ident ),* $(,)?) => {
        /// Every mergeable attribute of a [`BookRecord`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BookField {
            $($variant),*
        }

        impl BookField {
            /// The declared merge order. Shared by every merge call site.
            pub const ALL: &'static [BookField] = &[$(BookField::$variant),*];

            /// Attribute name as it appears in serialized records
            pub fn name(self) -> &'static str {
                match self {
                    $(BookField::$variant => stringify!($field)),*
                }
            }
        }

        impl BookRecord {
            /// Borrow one attribute
            pub fn slot(&self, field: BookField) -> FieldSlot<'_> {
                match field {
                    $(BookField::$variant => FieldSlot::$kind(&self.$field)),*
                }
            }

            /// Borrow one attribute from `dst` (mutably) and `src` at once
            pub fn pair<'a>(dst: &'a mut BookRecord, src: &'a BookRecord, field: BookField) -> FieldPair<'a> {
                match field {
                    $(BookField::$variant => FieldPair::$kind(&mut dst.$field, &src.$field)),*
                }
            }
        }
    };
}

book_fields! {
    Title => title: Text,
    Subtitle => subtitle: Text,
    Author => author: Text,
    Isbn10 => isbn10: Text,
    Isbn13 => isbn13: Text,
    Publisher => publisher: Text,
    PublishedDate => published_date: Text,
    FirstPublished => first_published: Text,
    CopyrightDate => copyright_date: Text,
    PlaceOfPublication => place_of_publication: Text,
    Language => language: Text,
    CoverUrl => cover_url: Text,
    CoverUrlLarge => cover_url_large: Text,
    Description => description: Text,
    Edition => edition: Text,
    Format => format: Text,
    PhysicalDescription => physical_description: Text,
    Dimensions => dimensions: Text,
    Weight => weight: Text,
    CallNumber => call_number: Text,
    DeweyDecimal => dewey_decimal: Text,
    Lccn => lccn: Text,
    OclcNumber => oclc_number: Text,
    OpenLibraryId => openlibrary_id: Text,
    GoogleBooksId => google_books_id: Text,
    HathiTrustId => hathitrust_id: Text,
    WorkKey => work_key: Text,
    Series => series: Text,
    SeriesNumber => series_number: Text,
    OriginalTitle => original_title: Text,
    Translator => translator: Text,
    Illustrator => illustrator: Text,
    Notes => notes: Text,
    TableOfContents => table_of_contents: Text,
    InfoUrl => info_url: Text,
    PreviewUrl => preview_url: Text,
    MaturityRating => maturity_rating: Text,
    PageCount => page_count: Count,
    RatingsCount => ratings_count: Count,
    EditionCount => edition_count: Count,
    Contributors => contributors: List,
    Subjects => subjects: List,
    Categories => categories: List,
    Classifications => classifications: List,
    Places => places: List,
    TimePeriods => time_periods: List,
    People => people: List,
    OtherIsbns => other_isbns: List,
    AlternateTitles => alternate_titles: List,
    Awards => awards: List,
}

impl BookRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record attributed to a provider
    pub fn from_source(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            data_sources: vec![source.clone()],
            source: Some(source),
            ..Default::default()
        }
    }

    /// Whether an attribute carries a usable value
    pub fn has(&self, field: BookField) -> bool {
        self.slot(field).is_filled()
    }

    /// Whether any mergeable attribute is filled
    pub fn has_data(&self) -> bool {
        BookField::ALL.iter().any(|f| self.has(*f))
    }

    /// The preferred identifier: ISBN-13 when known, otherwise ISBN-10
    pub fn isbn(&self) -> Option<&str> {
        self.isbn13
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.isbn10.as_deref().filter(|s| !s.is_empty()))
    }

    /// Every key this record can be matched by.
    ///
    /// Both ISBN forms are listed, and an ISBN-10 also yields its ISBN-13
    /// equivalent, so records carrying different forms of one ISBN share a key.
    pub fn identifier_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for isbn in [&self.isbn13, &self.isbn10].into_iter().flatten() {
            let isbn = isbn.trim();
            if isbn.is_empty() {
                continue;
            }
            let converted = isbn10_to_isbn13(isbn);
            for key in std::iter::once(isbn.to_string()).chain(converted) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Record `identifier` in the matching ISBN slot if that slot is empty
    pub fn fill_isbn(&mut self, identifier: &str) {
        let slot = match identifier.len() {
            13 => &mut self.isbn13,
            10 => &mut self.isbn10,
            _ => return,
        };
        if slot.as_deref().map_or(true, str::is_empty) {
            *slot = Some(identifier.to_string());
        }
    }

    /// Append a provider to `data_sources` unless it is already listed
    pub fn add_data_source(&mut self, source: &str) {
        if !self.data_sources.iter().any(|s| s == source) {
            self.data_sources.push(source.to_string());
        }
    }
}

/// The `978` ISBN-13 form of an ISBN-10
fn isbn10_to_isbn13(isbn10: &str) -> Option<String> {
    if isbn10.len() != 10 || !isbn10.is_ascii() {
        return None;
    }
    let body = format!("978{}", &isbn10[..9]);
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sum: u32 = body
        .bytes()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    Some(format!("{}{}", body, (10 - sum % 10) % 10))
}

/// Builder for constructing records in adapters and tests
#[derive(Debug, Clone, Default)]
pub struct BookRecordBuilder {
    record: BookRecord,
}

impl BookRecordBuilder {
    /// Start a record attributed to `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            record: BookRecord::from_source(source),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.record.title = Some(title.into());
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.record.subtitle = Some(subtitle.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.record.author = Some(author.into());
        self
    }

    pub fn isbn13(mut self, isbn: impl Into<String>) -> Self {
        self.record.isbn13 = Some(isbn.into());
        self
    }

    pub fn isbn10(mut self, isbn: impl Into<String>) -> Self {
        self.record.isbn10 = Some(isbn.into());
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.record.publisher = Some(publisher.into());
        self
    }

    pub fn published_date(mut self, date: impl Into<String>) -> Self {
        self.record.published_date = Some(date.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.record.language = Some(language.into());
        self
    }

    pub fn cover_url(mut self, url: impl Into<String>) -> Self {
        self.record.cover_url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.record.description = Some(description.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.record.format = Some(format.into());
        self
    }

    pub fn call_number(mut self, call_number: impl Into<String>) -> Self {
        self.record.call_number = Some(call_number.into());
        self
    }

    pub fn work_key(mut self, work_key: impl Into<String>) -> Self {
        self.record.work_key = Some(work_key.into());
        self
    }

    pub fn page_count(mut self, pages: u32) -> Self {
        self.record.page_count = Some(pages);
        self
    }

    pub fn subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.subjects = Some(subjects.into_iter().map(Into::into).collect());
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn classifications<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.classifications = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Build the record
    pub fn build(self) -> BookRecord {
        self.record
    }
}

/// Keep `value` only if it has visible content
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Keep `values` only if at least one entry has visible content
pub(crate) fn non_empty_list<I>(values: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = String>,
{
    let list: Vec<String> = values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!list.is_empty()).then_some(list)
}
