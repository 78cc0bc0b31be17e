// src/types/candidate.rs
//! Candidate records as ingested from an uploaded CSV

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Placeholder used in the greeting when a row carries no name
pub const DEFAULT_DISPLAY_NAME: &str = "Candidate";

/// Logical fields every candidate row is normalized to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateField {
    Name,
    Email,
    TestLink,
}

impl CandidateField {
    /// Map a header spelling onto a logical field.
    ///
    /// Matching ignores case and the `_`, `-` and space separators, so
    /// `Test_Link`, `test_link`, `testLink` and `TEST LINK` all resolve to
    /// [`CandidateField::TestLink`].
    pub fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "testlink" => Some(Self::TestLink),
            _ => None,
        }
    }
}

/// One ingested CSV row.
///
/// `fields` keeps the row exactly as parsed, in header order, so it can be
/// echoed back to the caller. The logical fields are resolved once when the
/// record is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    fields: Vec<(String, String)>,
    name: Option<String>,
    email: Option<String>,
    test_link: Option<String>,
}

impl CandidateRecord {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ordered: Vec<(String, String)> = Vec::new();
        for (key, value) in fields {
            let key = key.into();
            let value = value.into();
            // Repeated headers: the later cell wins, the key keeps its slot
            match ordered.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => ordered.push((key, value)),
            }
        }

        let mut record = Self {
            fields: ordered,
            name: None,
            email: None,
            test_link: None,
        };
        record.name = record.resolve(CandidateField::Name);
        record.email = record.resolve(CandidateField::Email);
        record.test_link = record.resolve(CandidateField::TestLink);
        record
    }

    /// First non-blank cell whose header maps to `field`, trimmed
    fn resolve(&self, field: CandidateField) -> Option<String> {
        self.fields
            .iter()
            .filter(|(header, _)| CandidateField::from_header(header) == Some(field))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn test_link(&self) -> Option<&str> {
        self.test_link.as_deref()
    }

    /// Email and link are both present, so the record can be dispatched
    pub fn is_deliverable(&self) -> bool {
        self.email.is_some() && self.test_link.is_some()
    }
}

// Serialized as the plain header -> value object the upload returned
impl Serialize for CandidateRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_variants() {
        assert_eq!(CandidateField::from_header("Name"), Some(CandidateField::Name));
        assert_eq!(CandidateField::from_header("name"), Some(CandidateField::Name));
        assert_eq!(CandidateField::from_header("Email"), Some(CandidateField::Email));
        assert_eq!(
            CandidateField::from_header("Test_Link"),
            Some(CandidateField::TestLink)
        );
        assert_eq!(
            CandidateField::from_header("testLink"),
            Some(CandidateField::TestLink)
        );
        assert_eq!(
            CandidateField::from_header("test-link"),
            Some(CandidateField::TestLink)
        );
        assert_eq!(CandidateField::from_header("Phone"), None);
    }

    #[test]
    fn test_resolves_first_non_blank_variant() {
        let record = CandidateRecord::from_fields([
            ("Email", "  "),
            ("email", " bob@example.com "),
            ("testLink", "http://t/2"),
        ]);

        assert_eq!(record.email(), Some("bob@example.com"));
        assert_eq!(record.test_link(), Some("http://t/2"));
        assert_eq!(record.name(), None);
        assert_eq!(record.display_name(), DEFAULT_DISPLAY_NAME);
        assert!(record.is_deliverable());
        // Raw cells stay untouched
        assert_eq!(record.get("email"), Some(" bob@example.com "));
    }

    #[test]
    fn test_missing_link_is_not_deliverable() {
        let record = CandidateRecord::from_fields([("Name", "Ada"), ("Email", "ada@x.com")]);
        assert!(!record.is_deliverable());
        assert_eq!(record.display_name(), "Ada");
    }

    #[test]
    fn test_repeated_header_keeps_position_and_last_value() {
        let record = CandidateRecord::from_fields([("Name", "A"), ("Email", "e"), ("Name", "B")]);
        assert_eq!(
            record.fields(),
            &[
                ("Name".to_string(), "B".to_string()),
                ("Email".to_string(), "e".to_string())
            ]
        );
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let record = CandidateRecord::from_fields([
            ("Name", "Ada"),
            ("Email", "ada@x.com"),
            ("Test_Link", "http://t/1"),
        ]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Name":"Ada","Email":"ada@x.com","Test_Link":"http://t/1"}"#
        );
    }
}
