use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Body for the by-id link endpoints. Older clients send camelCase keys.
#[derive(Debug, Deserialize)]
pub struct DiseaseLinkRequest {
    #[serde(default, alias = "userId", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "diseaseId", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub disease_id: Option<i64>,
}

impl DiseaseLinkRequest {
    pub fn require(&self) -> AppResult<(i64, i64)> {
        match (self.user_id, self.disease_id) {
            (Some(u), Some(d)) => Ok((u, d)),
            _ => Err(AppError::validation("user_id and disease_id are required")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiseaseNameRequest {
    #[serde(default, alias = "userId", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "diseaseName")]
    pub disease_name: Option<String>,
}

impl DiseaseNameRequest {
    pub fn require(&self) -> AppResult<(i64, &str)> {
        match (self.user_id, self.disease_name.as_deref().map(str::trim)) {
            (Some(u), Some(name)) if !name.is_empty() => Ok((u, name)),
            _ => Err(AppError::validation("user_id and disease_name are required")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_snake_and_camel_case() {
        let a: DiseaseLinkRequest = serde_json::from_value(json!({"user_id": 1, "disease_id": 2})).unwrap();
        let b: DiseaseLinkRequest = serde_json::from_value(json!({"userId": 1, "diseaseId": 2})).unwrap();
        assert_eq!(a.require().unwrap(), (1, 2));
        assert_eq!(b.require().unwrap(), (1, 2));
    }

    #[test]
    fn blank_disease_name_is_rejected() {
        let r: DiseaseNameRequest =
            serde_json::from_value(json!({"user_id": 1, "disease_name": "  "})).unwrap();
        assert!(r.require().is_err());
        let r: DiseaseNameRequest = serde_json::from_value(json!({"disease_name": "Diabetes"})).unwrap();
        assert!(r.require().is_err());
    }
}
