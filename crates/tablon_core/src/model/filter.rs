//! Board filter modes.
//!
//! The active mode is surfaced to users as a URL fragment (`#hoy`, `#semana`,
//! `#todas`) and persisted as `TODAY | WEEK | ALL`. Unknown values always
//! resolve to [`FilterMode::All`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Visible-subset selector for the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Notes dated on the current calendar day.
    Today,
    /// Notes dated within `[today, today + 7 days]`.
    Week,
    #[default]
    All,
}

impl FilterMode {
    /// Persisted/wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "TODAY",
            Self::Week => "WEEK",
            Self::All => "ALL",
        }
    }

    /// URL fragment token.
    pub fn fragment(self) -> &'static str {
        match self {
            Self::Today => "#hoy",
            Self::Week => "#semana",
            Self::All => "#todas",
        }
    }

    /// Resolves a URL fragment; anything unrecognized means [`FilterMode::All`].
    pub fn from_fragment(fragment: &str) -> Self {
        match fragment.trim().to_lowercase().as_str() {
            "#hoy" => Self::Today,
            "#semana" => Self::Week,
            _ => Self::All,
        }
    }

    /// Accepts wire tokens, fragment tokens with or without `#`, any case.
    pub fn parse_lenient(value: &str) -> Self {
        let normalized = value.trim().trim_start_matches('#').to_lowercase();
        match normalized.as_str() {
            "today" | "hoy" => Self::Today,
            "week" | "semana" => Self::Week,
            _ => Self::All,
        }
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FilterMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::FilterMode;

    #[test]
    fn fragment_tokens_are_case_insensitive_and_default_to_all() {
        assert_eq!(FilterMode::from_fragment("#HOY"), FilterMode::Today);
        assert_eq!(FilterMode::from_fragment("#semana"), FilterMode::Week);
        assert_eq!(FilterMode::from_fragment("#mañana"), FilterMode::All);
        assert_eq!(FilterMode::from_fragment(""), FilterMode::All);
    }

    #[test]
    fn lenient_parse_accepts_persisted_and_fragment_forms() {
        assert_eq!(FilterMode::parse_lenient("TODAY"), FilterMode::Today);
        assert_eq!(FilterMode::parse_lenient("#semana"), FilterMode::Week);
        assert_eq!(FilterMode::parse_lenient("#todas"), FilterMode::All);
        assert_eq!(FilterMode::parse_lenient("whatever"), FilterMode::All);
    }

    #[test]
    fn serde_uses_uppercase_tokens() {
        let json = serde_json::to_string(&FilterMode::Week).unwrap();
        assert_eq!(json, "\"WEEK\"");
        let decoded: FilterMode = serde_json::from_str("\"#hoy\"").unwrap();
        assert_eq!(decoded, FilterMode::Today);
    }
}
