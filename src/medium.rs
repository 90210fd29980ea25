//! Client for Medium's undocumented JSON endpoints.
//!
//! Every endpoint returns a text body with an anti-hijacking guard string
//! prepended to the JSON document; [`decode_body`] strips it before parsing.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Result as AnyResult};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::USER_AGENT;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

pub const MEDIUM_BASE_URL: &str = "https://medium.com";

/// Identifier of a post-shaped comment within Medium.
pub type CommentId = String;

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> AnyResult<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("medium client user agent required");
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        let base_url = config
            .base_url
            .unwrap_or_else(|| MEDIUM_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    /// Resolve a story page to its canonical post id and title.
    pub async fn resolve_post(&self, post_url: &Url) -> Result<Post> {
        let mut url = post_url.clone();
        url.query_pairs_mut().append_pair("format", "json");
        let envelope = self.fetch_envelope(url.as_str()).await?;

        let value = envelope.payload.value.ok_or_else(|| Error::NotFound {
            field: "payload.value",
            context: post_url.to_string(),
        })?;
        let id = value
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::NotFound {
                field: "payload.value.id",
                context: post_url.to_string(),
            })?;

        Ok(Post {
            id,
            title: value.title,
        })
    }

    /// All top-level response ids for a post, across every page of the
    /// responses stream, in the order the API reports them.
    ///
    /// Pages are requested sequentially; each request carries the previous
    /// page's `paging.next.to` cursor. The API terminating pagination is the
    /// only exit condition.
    pub async fn response_ids(&self, post_id: &str) -> Result<Vec<CommentId>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/_/api/posts/{}/responsesStream?filter=other",
                self.base_url, post_id
            );
            if let Some(to) = &cursor {
                url.push_str("&to=");
                url.extend(utf8_percent_encode(to, NON_ALPHANUMERIC));
            }

            let payload = self.fetch_envelope(&url).await?.payload;
            ids.extend(
                payload
                    .stream_items
                    .into_iter()
                    .filter_map(|item| item.post_preview)
                    .map(|preview| preview.post_id)
                    .filter(|id| !id.is_empty()),
            );

            cursor = payload.paging.and_then(|paging| paging.next).map(|next| next.to);
            if cursor.is_none() {
                break;
            }
            tracing::debug!(post_id, collected = ids.len(), "following responses cursor");
        }

        Ok(ids)
    }

    /// Full content envelope for one post-shaped comment.
    pub async fn post_content(&self, post_id: &str) -> Result<Envelope> {
        let url = format!("{}/post/{}?format=json", self.base_url, post_id);
        self.fetch_envelope(&url).await
    }

    async fn fetch_envelope(&self, url: &str) -> Result<Envelope> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

        let body = response.text().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        decode_body(&body)
    }
}

/// Strip the anti-hijacking prefix and parse the remaining JSON document.
pub fn decode_body(body: &str) -> Result<Envelope> {
    let start = body.find('{').ok_or_else(|| Error::Decode {
        reason: "no JSON object in body".to_string(),
    })?;
    serde_json::from_str(&body[start..]).map_err(|err| Error::Decode {
        reason: err.to_string(),
    })
}

/// A resolved story: the id its responses stream hangs off, plus the title
/// used for the rendered heading.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub payload: Payload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payload {
    pub value: Option<PostValue>,
    pub references: References,
    pub stream_items: Vec<StreamItem>,
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostValue {
    pub id: Option<String>,
    pub title: Option<String>,
    pub canonical_url: Option<String>,
    pub creator_id: Option<String>,
    pub first_published_at: Option<i64>,
    pub content: Option<PostContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostContent {
    pub body_model: BodyModel,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BodyModel {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Paragraph {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct References {
    #[serde(rename = "User", default)]
    pub users: HashMap<String, UserRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamItem {
    pub post_preview: Option<PostPreview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostPreview {
    pub post_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub next: Option<PageCursor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageCursor {
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_strips_guard_prefix() {
        let body = r#"])}while(1);</x>{"payload":{"value":{"id":"abc123"}}}"#;
        let envelope = decode_body(body).unwrap();
        assert_eq!(envelope.payload.value.unwrap().id.as_deref(), Some("abc123"));
    }

    #[test]
    fn decode_fails_without_json_object() {
        let err = decode_body("])}while(1);</x>").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn decode_fails_on_truncated_document() {
        let err = decode_body(r#"])}while(1);</x>{"payload":"#).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn stream_items_without_preview_deserialize() {
        let body = r#"])}while(1);</x>{"payload":{"streamItems":[{"itemType":"readMore"},{"postPreview":{"postId":"c9"}}]}}"#;
        let payload = decode_body(body).unwrap().payload;
        assert_eq!(payload.stream_items.len(), 2);
        assert!(payload.stream_items[0].post_preview.is_none());
        assert_eq!(
            payload.stream_items[1].post_preview.as_ref().unwrap().post_id,
            "c9"
        );
    }
}
