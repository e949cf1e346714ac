//! Trello API records
//!
//! Every field is optional on the wire. Missing or mistyped fields fall back
//! to their defaults, and collections are decoded element by element so one
//! malformed record does not sink its siblings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrelloBoard {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub desc: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient")]
    pub prefs: BoardPrefs,
}

/// Board display preferences, including every background variant Trello uses
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardPrefs {
    #[serde(deserialize_with = "lenient")]
    pub background_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub background_image: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub background_image_scaled: Vec<ScaledImage>,
    #[serde(deserialize_with = "lenient")]
    pub background_top_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub background_bottom_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub background_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub background_full_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub background_large_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScaledImage {
    #[serde(deserialize_with = "lenient_number")]
    pub width: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub height: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

impl ScaledImage {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrelloList {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_number")]
    pub pos: f64,
    #[serde(deserialize_with = "lenient")]
    pub closed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrelloCard {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub desc: String,
    #[serde(deserialize_with = "lenient_string")]
    pub id_list: String,
    #[serde(deserialize_with = "lenient_number")]
    pub pos: f64,
    #[serde(deserialize_with = "lenient")]
    pub due: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub labels: Vec<TrelloLabel>,
    #[serde(deserialize_with = "lenient_vec")]
    pub id_members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrelloLabel {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub color: String,
}

/// A `commentCard` action
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrelloComment {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub data: CommentData,
    #[serde(deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub member_creator: Option<MemberCreator>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommentData {
    #[serde(deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemberCreator {
    #[serde(deserialize_with = "lenient")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrelloAttachment {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrelloChecklist {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_number")]
    pub pos: f64,
    #[serde(deserialize_with = "lenient_vec")]
    pub check_items: Vec<TrelloCheckItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrelloCheckItem {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(deserialize_with = "lenient_number")]
    pub pos: f64,
}

/// Decode each element on its own, skipping the ones that do not fit `T`
pub fn decode_each<T: DeserializeOwned>(values: Vec<Value>, kind: &str) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("skipping malformed {}: {}", kind, e);
                None
            }
        })
        .collect()
}

// =============================================================================
// Lenient field decoders
// =============================================================================

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(decode_each(items, "element")),
        _ => Ok(Vec::new()),
    }
}

/// Strings, with numbers accepted in their decimal form
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Numbers, with numeric strings accepted. Trello sends `pos` either way.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
