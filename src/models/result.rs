//! Lookup outcome returned to collaborators.

use serde::{Deserialize, Serialize};

/// Placeholder written when nothing matched
pub const NOT_FOUND: &str = "Not Found";

/// Result of resolving one point.
///
/// Missing attributes are empty strings, never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    /// First catalog region in load order containing the point
    Matched {
        area: String,
        micromarket: String,
        zone: String,
    },
    /// First configured bounding box containing the point
    FallbackMatched {
        area: String,
        micromarket: String,
        zone: String,
    },
    Unmatched,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchResult::Unmatched)
    }

    pub fn area(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { area, .. } | MatchResult::FallbackMatched { area, .. } => {
                Some(area)
            }
            MatchResult::Unmatched => None,
        }
    }

    /// `"{area}; {micromarket}"`, or `"Not Found"`.
    ///
    /// Semicolon keeps the label a single CSV field without quoting.
    pub fn location_label(&self) -> String {
        match self {
            MatchResult::Matched {
                area, micromarket, ..
            }
            | MatchResult::FallbackMatched {
                area, micromarket, ..
            } => format!("{}; {}", area, micromarket),
            MatchResult::Unmatched => NOT_FOUND.to_string(),
        }
    }

    /// Zone display name: catalog zones get the region suffix appended,
    /// fallback zones already carry it.
    pub fn zone_label(&self, region_suffix: &str) -> String {
        match self {
            MatchResult::Matched { zone, .. } if !zone.is_empty() => {
                format!("{} {}", zone, region_suffix).trim_end().to_string()
            }
            MatchResult::FallbackMatched { zone, .. } => zone.clone(),
            _ => NOT_FOUND.to_string(),
        }
    }
}
