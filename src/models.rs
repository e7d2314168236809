/// Wire and domain types shared across the engine
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Authenticated user identity as confirmed by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of tracked record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    Movie,
    TvShow,
}

impl EntryType {
    /// Wire representation, as used in query strings and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Movie => "movie",
            EntryType::TvShow => "tv-show",
        }
    }
}

/// One tracked movie or TV-show record, owned by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub director: String,
    pub year: i32,
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an entry; everything the server assigns is absent
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryFields {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[validate(length(min = 1, max = 255, message = "Director must be between 1 and 255 characters"))]
    pub director: String,
    #[validate(range(min = 1800, message = "Year must be 1800 or later"))]
    pub year: i32,
    #[validate(range(min = 1, message = "Duration must be greater than zero"))]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Genre must be at most 100 characters"))]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 10.0, message = "Rating must be between 0 and 10"))]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Poster URL must be a valid URL"))]
    pub poster_url: Option<String>,
}

/// Partial update payload; absent fields are left untouched by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Director must be between 1 and 255 characters"))]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1800, message = "Year must be 1800 or later"))]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Duration must be greater than zero"))]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Genre must be at most 100 characters"))]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 10.0, message = "Rating must be between 0 and 10"))]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Poster URL must be a valid URL"))]
    pub poster_url: Option<String>,
}

/// The release-year grace window extends this far past the current year
const YEAR_GRACE: i32 = 10;

fn future_year_error(max: i32) -> ValidationError {
    let mut err = ValidationError::new("year_out_of_range");
    err.message = Some(format!("Year must be at most {}", max).into());
    err
}

impl CreateEntryFields {
    /// Full payload validation.
    ///
    /// The derive covers the static constraints; the upper bound on the
    /// release year moves with the clock (ten years from now) and is
    /// checked here.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let max = Utc::now().year() + YEAR_GRACE;
        if self.year > max {
            errors.add("year", future_year_error(max));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl UpdateEntryFields {
    /// Full payload validation; see [`CreateEntryFields::check`]
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let max = Utc::now().year() + YEAR_GRACE;
        if matches!(self.year, Some(year) if year > max) {
            errors.add("year", future_year_error(max));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Raw form input for an entry, prior to coercion and validation.
///
/// Numeric fields hold the text as typed; [`EntryDraft::assemble`]
/// applies the live-edit coercion rules (invalid numbers become 0,
/// optional text is trimmed and dropped when empty) and produces the
/// wire payload ready for validation.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: String,
    pub kind: Option<EntryType>,
    pub director: String,
    pub year: String,
    pub duration: String,
    pub genre: String,
    pub rating: String,
    pub description: String,
    pub poster_url: String,
}

impl EntryDraft {
    /// Coerce the raw inputs into a create payload.
    ///
    /// Defaults the kind to movie when unset, mirroring the form's
    /// initial selection.
    pub fn assemble(&self) -> CreateEntryFields {
        let rating = coerce_float(&self.rating);
        CreateEntryFields {
            title: self.title.clone(),
            kind: self.kind.unwrap_or(EntryType::Movie),
            director: self.director.clone(),
            year: coerce_int(&self.year),
            duration: coerce_int(&self.duration).max(0) as u32,
            genre: none_when_blank(&self.genre),
            rating: if rating == 0.0 { None } else { Some(rating) },
            description: none_when_blank(&self.description),
            poster_url: none_when_blank(&self.poster_url),
        }
    }
}

/// Invalid numeric input coerces to 0, matching live-edit behavior
fn coerce_int(input: &str) -> i32 {
    input.trim().parse().unwrap_or(0)
}

/// Invalid numeric input coerces to 0, matching live-edit behavior
fn coerce_float(input: &str) -> f32 {
    input.trim().parse().unwrap_or(0.0)
}

/// Trim an optional text field and drop it entirely when empty
fn none_when_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Login request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Registration request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProfile {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Successful authentication payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Payload of `GET /auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfPayload {
    pub user: User,
}

/// Sort key accepted by the list endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    CreatedAt,
    Title,
    Year,
    Rating,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::Title => "title",
            SortKey::Year => "year",
            SortKey::Rating => "rating",
        }
    }
}

/// Sort direction accepted by the list endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// The settled combination of search/filter/sort/page used for a fetch
#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuery {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub kind: Option<EntryType>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: String::new(),
            kind: None,
            sort_by: SortKey::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl EntryQuery {
    /// Query-string pairs for the list endpoint.
    ///
    /// Search is sent only when non-empty after trimming and the type
    /// filter only when active; page, limit and sort are always sent.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];

        let search = self.search.trim();
        if !search.is_empty() {
            pairs.push(("search", search.to_string()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.as_str().to_string()));
        }
        pairs.push(("sortBy", self.sort_by.as_str().to_string()));
        pairs.push(("sortOrder", self.sort_order.as_str().to_string()));

        pairs
    }
}

/// Pagination block accompanying a list response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Recompute `total_pages` from `total` and `limit`.
    ///
    /// The page count invariant (`total_pages = ceil(total / limit)`)
    /// holds regardless of what the server sent; `page` names the page
    /// actually returned and is kept as served.
    pub fn normalized(mut self) -> Self {
        if self.limit > 0 {
            self.total_pages = ((self.total + u64::from(self.limit) - 1) / u64::from(self.limit)) as u32;
        }
        self
    }
}

/// One page of the collection as returned by the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPage {
    pub data: Vec<Entry>,
    pub pagination: Pagination,
}

/// Server-computed collection statistics snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_entries: u64,
    pub movie_count: u64,
    pub tv_show_count: u64,
    pub average_rating: f64,
}

/// Test fixture shared across the crate's unit tests
#[cfg(test)]
pub(crate) fn sample_user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Test fixture shared across the crate's unit tests
#[cfg(test)]
pub(crate) fn sample_entry(id: &str, title: &str) -> Entry {
    Entry {
        id: id.to_string(),
        title: title.to_string(),
        kind: EntryType::Movie,
        director: "Someone".to_string(),
        year: 2020,
        duration: 120,
        genre: None,
        rating: None,
        description: None,
        poster_url: None,
        user_id: "1".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
