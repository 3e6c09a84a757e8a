#![forbid(unsafe_code)]

pub mod names {
    pub const MAX_NAME_LEN: usize = 128;

    /// Display label of an entry, also used as the chain's link value.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EntryName(String);

    impl EntryName {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, EntryNameError> {
            let value = value.into();
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(EntryNameError::Empty);
            }
            if trimmed.len() > MAX_NAME_LEN {
                return Err(EntryNameError::TooLong);
            }
            for (index, ch) in trimmed.chars().enumerate() {
                if ch.is_control() {
                    return Err(EntryNameError::InvalidChar { ch, index });
                }
            }
            Ok(Self(trimmed.to_string()))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum EntryNameError {
        Empty,
        TooLong,
        InvalidChar { ch: char, index: usize },
    }
}

pub mod model {
    /// One persisted row of the chain. `next` holds the name of the entry
    /// that follows this one; the tail carries `None`.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Entry {
        pub id: i64,
        pub name: String,
        pub next: Option<String>,
        pub created_at_ms: i64,
        pub updated_at_ms: i64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum Direction {
        #[default]
        Ascending,
        Descending,
    }

    impl Direction {
        pub fn as_str(self) -> &'static str {
            match self {
                Direction::Ascending => "ascending",
                Direction::Descending => "descending",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim().to_ascii_lowercase().as_str() {
                "ascending" | "asc" => Some(Direction::Ascending),
                "descending" | "desc" => Some(Direction::Descending),
                _ => None,
            }
        }
    }
}

pub mod query {
    pub const MIN_LIMIT: usize = 1;
    pub const MAX_LIMIT: usize = 100;
    pub const DEFAULT_LIMIT: usize = 100;
}

#[cfg(test)]
mod tests {
    use super::model::Direction;
    use super::names::{EntryName, EntryNameError};

    #[test]
    fn entry_name_trims_and_accepts_plain_labels() {
        let name = EntryName::try_new("  Anatoliy  ").expect("plain label must be valid");
        assert_eq!(name.as_str(), "Anatoliy");
    }

    #[test]
    fn entry_name_rejects_empty_and_oversized() {
        assert_eq!(EntryName::try_new("   "), Err(EntryNameError::Empty));
        assert_eq!(
            EntryName::try_new("x".repeat(super::names::MAX_NAME_LEN + 1)),
            Err(EntryNameError::TooLong)
        );
    }

    #[test]
    fn entry_name_rejects_control_chars() {
        assert!(matches!(
            EntryName::try_new("a\nb"),
            Err(EntryNameError::InvalidChar { ch: '\n', index: 1 })
        ));
    }

    #[test]
    fn direction_parses_both_spellings() {
        assert_eq!(Direction::parse("ASC"), Some(Direction::Ascending));
        assert_eq!(Direction::parse("descending"), Some(Direction::Descending));
        assert_eq!(Direction::parse("sideways"), None);
    }
}
