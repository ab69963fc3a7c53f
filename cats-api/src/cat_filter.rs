//! Allow-listed query parameters for `GET /v1/cat`.
//!
//! Each accepted key maps to exactly one column and operator. Unknown keys
//! and values that fail to parse are ignored rather than rejected.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Race, Sex};

pub const DEFAULT_LIMIT: i64 = 5;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    GreaterThan(i32),
    LessThan(i32),
    Equal(i32),
}

impl AgeFilter {
    /// Parses `>N`, `<N` or `=N`.
    fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.trim().chars();
        let operator = chars.next()?;
        let value: i32 = chars.as_str().parse().ok()?;
        match operator {
            '>' => Some(AgeFilter::GreaterThan(value)),
            '<' => Some(AgeFilter::LessThan(value)),
            '=' => Some(AgeFilter::Equal(value)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatFilter {
    pub id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
    pub race: Option<Race>,
    pub sex: Option<Sex>,
    pub has_matched: Option<bool>,
    pub age: Option<AgeFilter>,
    /// `Some(true)`: only the requester's cats; `Some(false)`: only others'.
    pub owned: Option<bool>,
    pub search: Option<String>,
}

impl Default for CatFilter {
    fn default() -> Self {
        Self {
            id: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            race: None,
            sex: None,
            has_matched: None,
            age: None,
            owned: None,
            search: None,
        }
    }
}

impl CatFilter {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let mut filter = Self::default();

        for (key, value) in params {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                "id" => filter.id = Uuid::parse_str(value).ok(),
                "limit" => {
                    if let Ok(limit) = value.parse::<i64>() {
                        filter.limit = limit.clamp(0, MAX_LIMIT);
                    }
                }
                "offset" => {
                    if let Ok(offset) = value.parse::<i64>() {
                        filter.offset = offset.max(0);
                    }
                }
                "race" => filter.race = value.parse().ok(),
                "sex" => filter.sex = value.parse().ok(),
                "hasMatched" => filter.has_matched = value.parse().ok(),
                "ageInMonth" => filter.age = AgeFilter::parse(value),
                "owned" => filter.owned = value.parse().ok(),
                "search" => filter.search = Some(value.to_string()),
                _ => {}
            }
        }

        filter
    }

    /// `search` as a case-insensitive LIKE pattern with wildcards escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}
