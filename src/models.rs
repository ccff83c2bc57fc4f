use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserBase {
    pub user_id: Uuid,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserLogin {
    pub user_id: Uuid,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 64, message = "must be between 8 and 64 characters"))]
    #[schema(min_length = 8, max_length = 64)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct User {
    pub user_id: Uuid,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    #[schema(min_length = 1, max_length = 50)]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    #[schema(min_length = 1, max_length = 50)]
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
}

impl From<&User> for UserBase {
    fn from(user: &User) -> Self {
        UserBase {
            user_id: user.user_id,
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserRegister {
    pub user_id: Uuid,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    #[schema(min_length = 1, max_length = 50)]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    #[schema(min_length = 1, max_length = 50)]
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
    /// Write-only; never returned.
    #[validate(length(min = 8, max = 64, message = "must be between 8 and 64 characters"))]
    #[schema(min_length = 8, max_length = 64)]
    pub password: String,
}

impl UserRegister {
    /// Splits off the write-only password.
    pub fn into_parts(self) -> (User, String) {
        let user = User {
            user_id: self.user_id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            birthday: self.birthday,
        };
        (user, self.password)
    }
}

/// A registered user as persisted in the users collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

impl Record for UserRecord {
    const COLLECTION: &'static str = "users";

    fn record_id(&self) -> Uuid {
        self.user.user_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Tweet {
    pub tweet_id: Uuid,
    #[validate(length(min = 1, max = 256, message = "must be between 1 and 256 characters"))]
    #[schema(min_length = 1, max_length = 256)]
    pub content: String,
    /// Defaults to the time the request is read.
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub updated_at: Option<DateTime<Utc>>,
    // Snapshot of the author at post time, not a reference into the users collection.
    #[validate(nested)]
    pub by: User,
}

impl Record for Tweet {
    const COLLECTION: &'static str = "tweets";

    fn record_id(&self) -> Uuid {
        self.tweet_id
    }
}

/// Timestamps in RFC 3339, or naive ISO 8601 (`T` or space separated) read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{}`", raw)))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{}`", raw))),
            None => Ok(None),
        }
    }
}
