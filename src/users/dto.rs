use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

#[derive(Debug, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub diseases: Vec<String>,
}

/// Partial profile update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, alias = "name")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, alias = "birthDate")]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    /// Disease names to add to the user's history. Unknown names are skipped.
    #[serde(default)]
    pub diseases: Vec<String>,
}

/// Validated column values for the UPDATE.
#[derive(Debug, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub birth_date: Option<time::Date>,
    pub photo: Option<String>,
}
