use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

/// Opaque identifier assigned at creation.
pub type BookId = String;

/// A stored bookshelf record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub year: Option<i32>,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    /// Always `page_count == read_page`; recomputed on every write.
    pub finished: bool,
    pub reading: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Book {
    /// Overwrite every caller-controlled field, keeping `id` and `inserted_at`.
    pub(crate) fn apply(&mut self, input: ValidBook, now: OffsetDateTime) {
        self.finished = input.is_finished();
        self.name = input.name;
        self.year = input.year;
        self.author = input.author;
        self.summary = input.summary;
        self.publisher = input.publisher;
        self.page_count = input.page_count;
        self.read_page = input.read_page;
        self.reading = input.reading;
        self.updated_at = now;
    }

    pub fn to_summary(&self) -> BookSummary {
        BookSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

/// Projection returned by the list operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: BookId,
    pub name: String,
    pub publisher: String,
}

/// Request body for create and update. `id` and `finished` are never read
/// from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookPayload {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub reading: bool,
}

/// Reasons a payload is refused before it touches the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide the book name")]
    MissingName,
    #[error("readPage cannot be greater than pageCount")]
    ReadPageExceedsPageCount,
}

/// A create/update body that could not be turned into a [`BookPayload`].
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{0}")]
    Malformed(#[from] serde_json::Error),
}

/// A payload that passed validation.
#[derive(Debug, Clone)]
pub struct ValidBook {
    pub name: String,
    pub year: Option<i32>,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub reading: bool,
}

impl ValidBook {
    pub fn is_finished(&self) -> bool {
        self.page_count == self.read_page
    }
}

impl BookPayload {
    /// Decode a raw JSON body. An absent, null or empty `name` is reported
    /// before any type error in the other fields.
    pub fn from_json(body: Value) -> Result<Self, PayloadError> {
        let name_missing = match body.get("name") {
            None | Some(Value::Null) => true,
            Some(Value::String(name)) => name.is_empty(),
            Some(_) => false,
        };
        if name_missing {
            return Err(ValidationError::MissingName.into());
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Name first, then the page bound.
    pub fn validate(self) -> Result<ValidBook, ValidationError> {
        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ValidationError::MissingName),
        };

        if self.read_page > self.page_count {
            return Err(ValidationError::ReadPageExceedsPageCount);
        }

        Ok(ValidBook {
            name,
            year: self.year,
            author: self.author,
            summary: self.summary,
            publisher: self.publisher,
            page_count: self.page_count,
            read_page: self.read_page,
            reading: self.reading,
        })
    }
}

/// Filters for the list operation; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub name: Option<String>,
    pub reading: Option<bool>,
    pub finished: Option<bool>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        let name_matches = match &self.name {
            Some(needle) => book.name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        };

        name_matches
            && self.reading.map_or(true, |reading| book.reading == reading)
            && self.finished.map_or(true, |finished| book.finished == finished)
    }
}

/// A boolean filter value that is not a finite number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a numeric flag; use 0 for false or any other number for true")]
pub struct InvalidFlag(pub String);

/// Decode a query flag: `0` is false, any other finite number is true.
pub fn parse_numeric_flag(raw: &str) -> Result<bool, InvalidFlag> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value != 0.0),
        _ => Err(InvalidFlag(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn payload(name: &str, page_count: u32, read_page: u32) -> BookPayload {
        BookPayload {
            name: Some(name.to_string()),
            page_count,
            read_page,
            ..BookPayload::default()
        }
    }

    #[test]
    fn missing_name_is_checked_before_pages() {
        let input = BookPayload {
            name: None,
            page_count: 10,
            read_page: 20,
            ..BookPayload::default()
        };
        assert_eq!(input.validate().unwrap_err(), ValidationError::MissingName);

        let input = payload("", 10, 5);
        assert_eq!(input.validate().unwrap_err(), ValidationError::MissingName);
    }

    #[test]
    fn read_page_above_page_count_is_refused() {
        let err = payload("Dune", 10, 20).validate().unwrap_err();
        assert_eq!(err, ValidationError::ReadPageExceedsPageCount);
    }

    #[test]
    fn payload_ignores_id_and_finished() {
        let input: BookPayload = serde_json::from_value(serde_json::json!({
            "id": "forged",
            "name": "Dune",
            "finished": true,
            "pageCount": 412,
            "readPage": 12,
        }))
        .unwrap();
        let valid = input.validate().unwrap();
        assert!(!valid.is_finished());
        assert_eq!(valid.author, "");
        assert_eq!(valid.year, None);
    }

    #[test]
    fn missing_name_wins_over_type_errors() {
        let err = BookPayload::from_json(serde_json::json!({"pageCount": "ten"})).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::Invalid(ValidationError::MissingName)
        ));

        let err = BookPayload::from_json(serde_json::json!({"name": "", "readPage": -4}))
            .unwrap_err();
        assert!(matches!(
            err,
            PayloadError::Invalid(ValidationError::MissingName)
        ));

        let err = BookPayload::from_json(serde_json::json!({"name": "Dune", "pageCount": "ten"}))
            .unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn payload_rejects_negative_pages() {
        let parsed = serde_json::from_value::<BookPayload>(serde_json::json!({
            "name": "Dune",
            "pageCount": -1,
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn book_serializes_camel_case_with_rfc3339() {
        let at = datetime!(2024-03-01 10:00:00 UTC);
        let book = Book {
            id: "abc".to_string(),
            name: "Dune".to_string(),
            year: Some(1965),
            author: "Frank Herbert".to_string(),
            summary: String::new(),
            publisher: "Chilton".to_string(),
            page_count: 412,
            read_page: 412,
            finished: true,
            reading: false,
            inserted_at: at,
            updated_at: at,
        };

        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["pageCount"], 412);
        assert_eq!(value["readPage"], 412);
        assert_eq!(value["insertedAt"], "2024-03-01T10:00:00Z");
        assert_eq!(value["updatedAt"], "2024-03-01T10:00:00Z");
    }

    #[test]
    fn numeric_flags() {
        assert_eq!(parse_numeric_flag("0"), Ok(false));
        assert_eq!(parse_numeric_flag("0.0"), Ok(false));
        assert_eq!(parse_numeric_flag("1"), Ok(true));
        assert_eq!(parse_numeric_flag("-3"), Ok(true));
        assert!(parse_numeric_flag("yes").is_err());
        assert!(parse_numeric_flag("").is_err());
        assert!(parse_numeric_flag("NaN").is_err());
    }
}
