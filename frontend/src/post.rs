use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Backend-allocated child key of a post.
pub type PostId = String;
/// User id handed out by the identity provider.
pub type UserId = String;

/// A post record as stored under `posts/<id>` and `user-posts/<uid>/<id>`.
///
/// The id is the record's key and is not part of the value. Records are
/// written by other clients too, so field values of the wrong shape are
/// coerced instead of rejecting the whole post.
#[derive(Hash, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub uid: UserId,
    #[serde(
        rename = "authorPic",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_pic: Option<String>,
    /// Anything but a non-negative integer reads as no count.
    #[serde(
        rename = "starCount",
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub star_count: Option<u64>,
}

/// Strings as they are, null as empty, other scalars in their JSON form.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_u64())
}

impl Post {
    pub fn new(
        uid: UserId,
        author: String,
        author_pic: Option<String>,
        title: String,
        body: String,
    ) -> Self {
        Post {
            title,
            body,
            author: Some(author),
            uid,
            author_pic,
            star_count: None,
        }
    }
}

/// Profile record under `users/<uid>`, rewritten on every sign-in.
#[derive(Hash, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl From<&Identity> for UserProfile {
    fn from(identity: &Identity) -> Self {
        UserProfile {
            username: identity.display_name.clone(),
            email: identity.email.clone(),
            profile_picture: identity.photo_url.clone(),
        }
    }
}

/// The signed-in user as reported by the session provider.
#[derive(Hash, Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Display name to stamp on a new post. Empty usernames count as missing.
pub fn author_name<'a>(profile: Option<&'a UserProfile>, anonymous: &'a str) -> &'a str {
    profile
        .and_then(|profile| profile.username.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or(anonymous)
}
