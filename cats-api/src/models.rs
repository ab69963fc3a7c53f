use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::schema::{cat_matches, cats, users};

// --- Enumerations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Race {
    Persian,
    #[serde(rename = "Maine Coon")]
    MaineCoon,
    Siamese,
    Ragdoll,
    Bengal,
    Sphynx,
    #[serde(rename = "British Shorthair")]
    BritishShorthair,
    Abyssinian,
    #[serde(rename = "Scottish Fold")]
    ScottishFold,
    Birman,
}

impl Race {
    pub const ALL: [Race; 10] = [
        Race::Persian,
        Race::MaineCoon,
        Race::Siamese,
        Race::Ragdoll,
        Race::Bengal,
        Race::Sphynx,
        Race::BritishShorthair,
        Race::Abyssinian,
        Race::ScottishFold,
        Race::Birman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Race::Persian => "Persian",
            Race::MaineCoon => "Maine Coon",
            Race::Siamese => "Siamese",
            Race::Ragdoll => "Ragdoll",
            Race::Bengal => "Bengal",
            Race::Sphynx => "Sphynx",
            Race::BritishShorthair => "British Shorthair",
            Race::Abyssinian => "Abyssinian",
            Race::ScottishFold => "Scottish Fold",
            Race::Birman => "Birman",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Race {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Race::ALL
            .into_iter()
            .find(|race| race.as_str() == s)
            .ok_or_else(|| format!("unknown race: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(format!("unknown sex: {s}")),
        }
    }
}

/// Lifecycle of a match request. `Waiting` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Waiting,
    Accepted,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Waiting => "waiting",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(MatchStatus::Waiting),
            "accepted" => Ok(MatchStatus::Accepted),
            "rejected" => Ok(MatchStatus::Rejected),
            _ => Err(format!("unknown match status: {s}")),
        }
    }
}

/// The receiver's answer to a waiting match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDecision {
    Accepted,
    Rejected,
}

impl From<MatchDecision> for MatchStatus {
    fn from(decision: MatchDecision) -> Self {
        match decision {
            MatchDecision::Accepted => MatchStatus::Accepted,
            MatchDecision::Rejected => MatchStatus::Rejected,
        }
    }
}

// --- Users ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

// --- Cats ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = cats)]
pub struct Cat {
    pub id: Uuid,
    pub name: String,
    pub race: String,
    pub sex: String,
    pub age_in_month: i32,
    pub description: String,
    pub image_urls: Vec<String>,
    pub has_matched: bool,
    pub owned_by_id: Uuid,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cats)]
pub struct NewCat {
    pub name: String,
    pub race: String,
    pub sex: String,
    pub age_in_month: i32,
    pub description: String,
    pub image_urls: Vec<String>,
    pub owned_by_id: Uuid,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = cats)]
pub struct CatChanges {
    pub name: String,
    pub race: String,
    pub sex: String,
    pub age_in_month: i32,
    pub description: String,
    pub image_urls: Vec<String>,
}

// --- Cat matches ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = cat_matches)]
pub struct CatMatch {
    pub id: Uuid,
    pub issuer_cat_id: Uuid,
    pub receiver_cat_id: Uuid,
    pub issued_by_id: Uuid,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cat_matches)]
pub struct NewCatMatch {
    pub issuer_cat_id: Uuid,
    pub receiver_cat_id: Uuid,
    pub issued_by_id: Uuid,
    pub message: String,
    pub status: String,
}

/// A match row together with the rows it references.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub cat_match: CatMatch,
    pub issuer: User,
    pub issuer_cat: Cat,
    pub receiver_cat: Cat,
}

impl MatchRecord {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.cat_match.issued_by_id == user_id || self.receiver_cat.owned_by_id == user_id
    }
}

// --- Requests ---

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 5, max = 50, message = "name length should be between 5 and 50 characters"))]
    pub name: String,
    #[validate(length(min = 5, max = 15, message = "password length should be between 5 and 15 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 5, max = 15, message = "password length should be between 5 and 15 characters"))]
    pub password: String,
}

/// Body of both `POST /v1/cat` and `PUT /v1/cat/:id`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CatRequest {
    #[validate(length(min = 1, max = 30, message = "name length should be between 1 and 30 characters"))]
    pub name: String,
    pub race: Race,
    pub sex: Sex,
    #[validate(range(min = 1, max = 120082, message = "age must be between 1 and 120082 months"))]
    pub age_in_month: i32,
    #[validate(length(min = 1, max = 200, message = "description length should be between 1 and 200 characters"))]
    pub description: String,
    #[validate(
        length(min = 1, message = "at least one image url is required"),
        custom = "validate_image_urls"
    )]
    pub image_urls: Vec<String>,
}

fn validate_image_urls(urls: &[String]) -> Result<(), ValidationError> {
    if urls.iter().all(|url| validator::validate_url(url.as_str())) {
        Ok(())
    } else {
        let mut err = ValidationError::new("image_url");
        err.message = Some("image urls must be valid urls".into());
        Err(err)
    }
}

impl CatRequest {
    pub fn into_new_cat(self, owner: Uuid) -> NewCat {
        NewCat {
            name: self.name,
            race: self.race.to_string(),
            sex: self.sex.to_string(),
            age_in_month: self.age_in_month,
            description: self.description,
            image_urls: self.image_urls,
            owned_by_id: owner,
        }
    }

    pub fn into_changes(self) -> CatChanges {
        CatChanges {
            name: self.name,
            race: self.race.to_string(),
            sex: self.sex.to_string(),
            age_in_month: self.age_in_month,
            description: self.description,
            image_urls: self.image_urls,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    /// The other user's cat.
    pub match_cat_id: Uuid,
    /// The requester's own cat.
    pub user_cat_id: Uuid,
    #[validate(length(min = 5, max = 120, message = "message length should be between 5 and 120 characters"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RespondMatchRequest {
    pub status: MatchDecision,
}

// --- Responses ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub email: String,
    pub name: String,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatView {
    pub id: Uuid,
    pub name: String,
    pub race: String,
    pub sex: String,
    pub age_in_month: i32,
    pub description: String,
    pub image_urls: Vec<String>,
    pub has_matched: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Cat> for CatView {
    fn from(cat: Cat) -> Self {
        Self {
            id: cat.id,
            name: cat.name,
            race: cat.race,
            sex: cat.sex,
            age_in_month: cat.age_in_month,
            description: cat.description,
            image_urls: cat.image_urls,
            has_matched: cat.has_matched,
            created_at: cat.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: Uuid,
    pub issued_by: UserSummary,
    pub match_cat_detail: CatView,
    pub user_cat_detail: CatView,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<MatchRecord> for MatchView {
    fn from(record: MatchRecord) -> Self {
        Self {
            id: record.cat_match.id,
            issued_by: UserSummary {
                name: record.issuer.name,
                email: record.issuer.email,
                created_at: record.issuer.created_at,
            },
            match_cat_detail: record.receiver_cat.into(),
            user_cat_detail: record.issuer_cat.into(),
            message: record.cat_match.message,
            status: record.cat_match.status,
            created_at: record.cat_match.created_at,
        }
    }
}
