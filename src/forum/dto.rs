use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub author_photo: Option<String>,
    pub image: Option<String>,
    pub caption: String,
    pub like_count: i64,
    pub reply_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct Thread {
    #[serde(flatten)]
    pub post: Post,
    pub replies: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    #[serde(default, alias = "id_user", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "gambar")]
    pub image: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub reply_to: Option<i64>,
}

#[derive(Debug, PartialEq)]
pub struct NewPost {
    pub user_id: i64,
    pub image: Option<String>,
    pub caption: String,
    pub reply_to: Option<i64>,
}

impl NewPostRequest {
    pub fn validate(self) -> AppResult<NewPost> {
        let caption = self.caption.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        let (Some(user_id), Some(caption)) = (self.user_id, caption) else {
            return Err(AppError::validation("user_id and caption are required"));
        };
        Ok(NewPost {
            user_id,
            image: self.image.filter(|i| !i.trim().is_empty()),
            caption,
            reply_to: self.reply_to,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    #[serde(default, alias = "id_user", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}
