use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An account together with its learner profile, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub account_created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Profile {
    pub id: Uuid,
    pub bio: String,
    pub profile_picture: String,
    pub is_public: bool,
}

/// What anyone may see about a user with a public profile.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PublicUser {
    pub username: String,
    pub profile: Profile,
}

/// What a user sees about themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PrivateUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub account_created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub profile: Profile,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            profile: user.profile.clone(),
        }
    }
}

impl From<User> for PrivateUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            account_created_at: user.account_created_at,
            last_login_at: user.last_login_at,
            profile: user.profile,
        }
    }
}

/// Issued on login; the raw token is only ever returned once.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SessionToken {
    pub auth_token: String,
}
