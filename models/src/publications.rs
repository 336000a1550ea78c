use serde::{Deserialize, Serialize};
use bincode::{Encode, Decode};

use crate::errors::{ValidationError, ValidationReport};
use crate::identifiers::UserKey;
use crate::timestamp::BincodeDateTime;

pub const TITLE_LIMIT: usize = 200;

/// How many published items the dashboard feed shows by default.
pub const DEFAULT_FEED_LIMIT: usize = 10;

/// A dashboard announcement. Unpublished items stay stored but never reach
/// the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Publication {
    pub id: u64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "imagen")]
    pub image_path: Option<String>,
    #[serde(rename = "fecha_publicacion")]
    pub published_at: BincodeDateTime,
    #[serde(rename = "autor")]
    pub author_key: Option<UserKey>,
    #[serde(rename = "publicado")]
    pub published: bool,
}

/// Input for a new publication.
#[derive(Debug, Clone, Default)]
pub struct NewPublication {
    pub title: String,
    pub image_path: Option<String>,
    pub published: bool,
}

impl NewPublication {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let title = self.title.trim();
        if title.is_empty() {
            report.push("titulo", ValidationError::MissingField("titulo".to_string()));
        } else if title.chars().count() > TITLE_LIMIT {
            report.push("titulo", ValidationError::TooLong("titulo".to_string(), TITLE_LIMIT));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_require_a_title() {
        let new = NewPublication { title: "  ".to_string(), ..NewPublication::default() };
        assert_eq!(new.validate().len(), 1);
    }

    #[test]
    fn should_cap_title_length() {
        let new = NewPublication { title: "t".repeat(201), ..NewPublication::default() };
        assert_eq!(new.validate().len(), 1);
        let ok = NewPublication { title: "t".repeat(200), ..NewPublication::default() };
        assert!(ok.validate().is_empty());
    }
}
