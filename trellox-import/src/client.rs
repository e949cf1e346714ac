//! Trello REST client
//!
//! Every request is a GET against `import.api_base_url` authenticated with the
//! account's API key and token as query parameters. Collections are decoded
//! element by element so one malformed record only drops itself.

use crate::error::{ImportError, Result};
use crate::source::ImportSource;
use crate::types::{
    decode_each, TrelloAttachment, TrelloBoard, TrelloCard, TrelloChecklist, TrelloComment,
    TrelloList,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use trellox_config::ImportSettings;
use url::Url;

const BOARD_FIELDS: &str = "name,desc,url,prefs";
const LIST_FIELDS: &str = "name,pos,closed";
const CARD_FIELDS: &str = "name,desc,idList,pos,due,dueComplete,labels,idMembers";
const ATTACHMENT_FIELDS: &str = "name,url,date";
const CHECKLIST_FIELDS: &str = "name,pos";
const CHECK_ITEM_FIELDS: &str = "name,state,pos";

/// API key and user token for the Trello account being imported
#[derive(Clone)]
pub struct TrelloCredentials {
    pub api_key: String,
    pub token: String,
}

impl TrelloCredentials {
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for TrelloCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrelloCredentials")
            .field("api_key", &"<redacted>")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TrelloClient {
    client: Client,
    base: Url,
    credentials: TrelloCredentials,
}

impl TrelloClient {
    pub fn new(settings: &ImportSettings, credentials: TrelloCredentials) -> Result<Self> {
        let base = Url::parse(&settings.api_base_url).map_err(|e| ImportError::InvalidUrl {
            url: settings.api_base_url.clone(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ImportError::InvalidUrl {
                url: settings.api_base_url.clone(),
                message: "not a base URL".into(),
            });
        }

        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| ImportError::Network {
                url: settings.api_base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base,
            credentials,
        })
    }

    /// Build `{base}/{segments..}?key=..&token=..&{params..}`
    fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ImportError::InvalidUrl {
                url: self.base.to_string(),
                message: "not a base URL".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("key", &self.credentials.api_key)
            .append_pair("token", &self.credentials.token)
            .extend_pairs(params);
        Ok(url)
    }

    /// GET a JSON document. Errors name the path only so credentials stay
    /// out of logs.
    async fn get_json(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Value> {
        let url = self.endpoint(segments, params)?;
        let path = url.path().to_string();
        debug!("GET {}", path);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImportError::from_reqwest(&path, e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Http {
                url: path,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ImportError::Decode {
                url: path,
                message: e.without_url().to_string(),
            })
    }

    async fn get_collection<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
        kind: &str,
    ) -> Result<Vec<T>> {
        match self.get_json(segments, params).await? {
            Value::Array(items) => Ok(decode_each(items, kind)),
            _ => Err(ImportError::Decode {
                url: segments.join("/"),
                message: format!("expected an array of {kind}s"),
            }),
        }
    }
}

#[async_trait]
impl ImportSource for TrelloClient {
    #[instrument(skip(self))]
    async fn boards(&self) -> Result<Vec<TrelloBoard>> {
        self.get_collection(
            &["members", "me", "boards"],
            &[("fields", BOARD_FIELDS)],
            "board",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn board_detail(&self, board: &str) -> Result<TrelloBoard> {
        let value = self
            .get_json(
                &["boards", board],
                &[("fields", BOARD_FIELDS), ("board_fields", "prefs")],
            )
            .await?;
        serde_json::from_value(value).map_err(|e| ImportError::Decode {
            url: format!("boards/{board}"),
            message: e.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn lists(&self, board: &str) -> Result<Vec<TrelloList>> {
        self.get_collection(&["boards", board, "lists"], &[("fields", LIST_FIELDS)], "list")
            .await
    }

    #[instrument(skip(self))]
    async fn cards(&self, board: &str) -> Result<Vec<TrelloCard>> {
        self.get_collection(&["boards", board, "cards"], &[("fields", CARD_FIELDS)], "card")
            .await
    }

    #[instrument(skip(self))]
    async fn comments(&self, card: &str) -> Result<Vec<TrelloComment>> {
        self.get_collection(
            &["cards", card, "actions"],
            &[("filter", "commentCard")],
            "comment",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn attachments(&self, card: &str) -> Result<Vec<TrelloAttachment>> {
        self.get_collection(
            &["cards", card, "attachments"],
            &[("fields", ATTACHMENT_FIELDS)],
            "attachment",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn checklists(&self, card: &str) -> Result<Vec<TrelloChecklist>> {
        self.get_collection(
            &["cards", card, "checklists"],
            &[
                ("fields", CHECKLIST_FIELDS),
                ("checkItems", "all"),
                ("checkItem_fields", CHECK_ITEM_FIELDS),
            ],
            "checklist",
        )
        .await
    }
}
