use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, FromRow)]
pub struct TipCard {
    pub id: i64,
    pub author_name: String,
    pub title: String,
    pub image: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct TipRow {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct TipDetail {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub hashtags: Vec<String>,
}

impl TipDetail {
    pub fn new(row: TipRow, hashtags: Vec<String>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            author_name: row.author_name,
            title: row.title,
            body: row.body,
            image: row.image,
            created_at: row.created_at,
            hashtags,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTipRequest {
    #[serde(default, deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub struct NewTip {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub hashtags: Vec<String>,
}

impl NewTipRequest {
    pub fn validate(self) -> AppResult<NewTip> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let body = self.body.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        let (Some(user_id), Some(title), Some(body)) = (self.user_id, title, body) else {
            return Err(AppError::validation("user_id, title and body are required"));
        };
        Ok(NewTip {
            user_id,
            title,
            body,
            image: self.image.filter(|i| !i.trim().is_empty()),
            hashtags: normalize_hashtags(&self.hashtags),
        })
    }
}

/// Strips leading `#`, trims, drops empties and case-insensitive duplicates.
pub fn normalize_hashtags(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim().trim_start_matches('#').trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}
