use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use playsync_store::PrimaryKey;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(max = 128))]
    pub username: Option<String>,
    #[validate(length(max = 128))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub password: String,
}

/// Validated against registration fields read out of the multipart form
#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 128))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefreshSchema {
    pub refresh_token: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordSchema {
    #[validate(length(min = 1, max = 64))]
    pub old_password: String,
    #[validate(length(min = 8, max = 64))]
    pub new_password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAccountSchema {
    #[validate(length(min = 1, max = 128))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommentSchema {
    #[validate(length(min = 1, max = 512))]
    pub content: String,
}

/// Validated against title and description read out of the multipart form
#[derive(Debug, Validate, Deserialize)]
pub struct VideoDetailsSchema {
    #[validate(length(min = 1, max = 128))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaylistSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 1024))]
    pub description: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TweetSchema {
    #[validate(length(min = 1, max = 280))]
    pub content: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WatchHistorySchema {
    pub video_id: PrimaryKey,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HistoryDeleteSchema {
    /// Clears the entire history when omitted
    pub video_id: Option<PrimaryKey>,
}

/// Query parameters for the paginated video listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<PrimaryKey>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ServerError::Validation(e.to_string()))?;

        extracted_json
            .0
            .validate()
            .map_err(|e| ServerError::Validation(e.to_string()))?;

        Ok(Self(extracted_json.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_login_schema_accepts_either_identity() {
        let by_username: LoginSchema =
            serde_json::from_str(r#"{ "username": "kira", "password": "hunter22" }"#)
                .expect("parses");

        let by_email: LoginSchema =
            serde_json::from_str(r#"{ "email": "kira@example.com", "password": "hunter22" }"#)
                .expect("parses");

        assert!(by_username.validate().is_ok());
        assert!(by_email.validate().is_ok());
    }

    #[test]
    fn test_register_schema_rejects_bad_fields() {
        let short_password = RegisterSchema {
            username: "kira".to_string(),
            email: "kira@example.com".to_string(),
            password: "short".to_string(),
            full_name: "Kira".to_string(),
        };

        let bad_email = RegisterSchema {
            username: "kira".to_string(),
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
            full_name: "Kira".to_string(),
        };

        assert!(short_password.validate().is_err());
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_tweet_schema_limits_length() {
        let too_long = TweetSchema {
            content: "a".repeat(281),
        };

        let fine = TweetSchema {
            content: "a".repeat(280),
        };

        assert!(too_long.validate().is_err());
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_video_list_query_is_camel_case() {
        let query: VideoListQuery =
            serde_json::from_str(r#"{ "sortBy": "views", "sortType": "asc", "userId": 3 }"#)
                .expect("parses");

        assert_eq!(query.sort_by.as_deref(), Some("views"));
        assert_eq!(query.sort_type.as_deref(), Some("asc"));
        assert_eq!(query.user_id, Some(3));
    }
}
