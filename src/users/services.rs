use sqlx::PgPool;
use tracing::{debug, info};

use super::dto::{UpdateUserRequest, UserChanges, UserProfile};
use super::repo;
use crate::auth::repo_types::User;
use crate::auth::services::{hash_password, is_valid_email, normalize_email, parse_birth_date};
use crate::diseases;
use crate::error::{is_unique_violation, AppError, AppResult};

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Turns the request into column values, hashing a new password.
pub fn prepare_changes(req: &UpdateUserRequest) -> AppResult<UserChanges> {
    let email = match non_blank(req.email.clone()) {
        Some(raw) => {
            let email = normalize_email(&raw);
            if !is_valid_email(&email) {
                return Err(AppError::validation("Invalid email"));
            }
            Some(email)
        }
        None => None,
    };
    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };

    Ok(UserChanges {
        username: non_blank(req.username.clone()),
        email,
        password_hash,
        birth_date: parse_birth_date(req.birth_date.as_deref())?,
        photo: non_blank(req.photo.clone()),
    })
}

pub async fn load_profile(db: &PgPool, id: i64) -> AppResult<UserProfile> {
    let user = User::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let diseases = diseases::repo::names_for_user(db, id).await?;
    Ok(UserProfile { user, diseases })
}

/// Applies the profile changes and links the named diseases in one transaction.
pub async fn update_profile(db: &PgPool, id: i64, req: &UpdateUserRequest) -> AppResult<UserProfile> {
    let changes = prepare_changes(req)?;
    let mut tx = db.begin().await?;

    let user = repo::update_tx(&mut tx, id, &changes)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Email already registered")
            } else {
                e.into()
            }
        })?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    for name in req.diseases.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        match diseases::repo::find_id_by_name(&mut *tx, name).await? {
            Some(disease_id) => {
                diseases::repo::link(&mut *tx, id, disease_id).await?;
            }
            None => debug!(user_id = id, disease = name, "unknown disease skipped"),
        }
    }
    let disease_names = diseases::repo::names_for_user(&mut *tx, id).await?;

    tx.commit().await?;
    info!(user_id = id, "profile updated");
    Ok(UserProfile {
        user,
        diseases: disease_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::verify_password;
    use time::macros::date;

    #[test]
    fn empty_request_changes_nothing() {
        let changes = prepare_changes(&UpdateUserRequest::default()).unwrap();
        assert_eq!(changes, UserChanges::default());
    }

    #[test]
    fn fields_are_normalised_and_password_hashed() {
        let req = UpdateUserRequest {
            username: Some("  Sari ".into()),
            email: Some(" Sari@Example.COM ".into()),
            password: Some("rahasia".into()),
            birth_date: Some("1999-12-31".into()),
            photo: Some("".into()),
            diseases: vec![],
        };
        let c = prepare_changes(&req).unwrap();
        assert_eq!(c.username.as_deref(), Some("Sari"));
        assert_eq!(c.email.as_deref(), Some("sari@example.com"));
        assert_eq!(c.birth_date, Some(date!(1999-12-31)));
        assert_eq!(c.photo, None);
        let hash = c.password_hash.unwrap();
        assert_ne!(hash, "rahasia");
        assert!(verify_password("rahasia", &hash).unwrap());
    }

    #[test]
    fn bad_email_or_date_is_a_validation_error() {
        let req = UpdateUserRequest {
            email: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(prepare_changes(&req), Err(AppError::Validation(_))));

        let req = UpdateUserRequest {
            birth_date: Some("31/12/1999".into()),
            ..Default::default()
        };
        assert!(matches!(prepare_changes(&req), Err(AppError::Validation(_))));
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let req: UpdateUserRequest = serde_json::from_str(
            r#"{"name": "Budi", "birthDate": "2001-02-03", "diseases": ["Diabetes"]}"#,
        )
        .unwrap();
        assert_eq!(req.username.as_deref(), Some("Budi"));
        assert_eq!(req.birth_date.as_deref(), Some("2001-02-03"));
        assert_eq!(req.diseases, vec!["Diabetes"]);
    }
}
