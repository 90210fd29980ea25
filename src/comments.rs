//! Reconstruction of a post's reply tree from the responses stream.

use chrono::{DateTime, TimeZone, Utc};
use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{Error, Result};
use crate::medium::{Client, CommentId, Envelope};

/// One response in the thread, with its own replies attached.
///
/// Records leave [`fetch_tree`] with `children` fully populated; a partially
/// built record is never observed outside this module.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: CommentId,
    pub url: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub paragraphs: Vec<String>,
    pub children: Vec<CommentRecord>,
}

impl CommentRecord {
    /// Project a fetched content envelope into a record with empty children.
    ///
    /// Paragraphs keep their plain text only; inline markup and quoted
    /// passages (`references.Quote`) are dropped.
    pub fn from_envelope(envelope: Envelope) -> Result<Self> {
        let payload = envelope.payload;
        let value = payload
            .value
            .ok_or_else(|| Error::MalformedRecord("missing payload.value".to_string()))?;
        let id = value
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::MalformedRecord("missing payload.value.id".to_string()))?;

        let url = value
            .canonical_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::MalformedRecord(format!("comment {id}: missing canonicalUrl")))?;

        let creator_id = value
            .creator_id
            .filter(|creator| !creator.is_empty())
            .ok_or_else(|| Error::MalformedRecord(format!("comment {id}: missing creatorId")))?;
        let author = payload
            .references
            .users
            .get(&creator_id)
            .map(|user| user.name.clone())
            .ok_or_else(|| {
                Error::MalformedRecord(format!(
                    "comment {id}: creator {creator_id} has no references.User entry"
                ))
            })?;

        let millis = value.first_published_at.ok_or_else(|| {
            Error::MalformedRecord(format!("comment {id}: missing firstPublishedAt"))
        })?;
        let published_at = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
            Error::MalformedRecord(format!("comment {id}: firstPublishedAt {millis} out of range"))
        })?;

        let paragraphs = value
            .content
            .ok_or_else(|| Error::MalformedRecord(format!("comment {id}: missing content")))?
            .body_model
            .paragraphs
            .into_iter()
            .map(|paragraph| paragraph.text)
            .collect();

        Ok(CommentRecord {
            id,
            url,
            author,
            published_at,
            paragraphs,
            children: Vec::new(),
        })
    }

    /// Number of records in this subtree, itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(CommentRecord::count).sum::<usize>()
    }
}

/// Fetch the full reply tree beneath a post.
///
/// Sibling fetches at each level are issued concurrently and awaited
/// together; a comment recurses into its own replies only once its content
/// has resolved. Order follows the responses stream. Any single failure
/// aborts the whole batch.
///
/// Depth is unbounded; a cyclic reply graph (never observed from the real
/// API) would not terminate.
pub fn fetch_tree<'a>(client: &'a Client, post_id: &'a str) -> BoxFuture<'a, Result<Vec<CommentRecord>>> {
    async move {
        let ids = client.response_ids(post_id).await?;
        future::try_join_all(ids.into_iter().map(|id| fetch_comment(client, id))).await
    }
    .boxed()
}

async fn fetch_comment(client: &Client, id: CommentId) -> Result<CommentRecord> {
    let envelope = client.post_content(&id).await?;
    let mut comment = CommentRecord::from_envelope(envelope)?;
    comment.children = fetch_tree(client, &comment.id).await?;
    tracing::debug!(comment = %comment.id, replies = comment.children.len(), "fetched comment");
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn projects_a_full_envelope() {
        let comment = CommentRecord::from_envelope(envelope(json!({
            "payload": {
                "value": {
                    "id": "c1",
                    "canonicalUrl": "https://medium.com/@ada/c1",
                    "creatorId": "u1",
                    "firstPublishedAt": 1_546_300_800_000_i64,
                    "content": {
                        "bodyModel": {
                            "paragraphs": [{"text": "First."}, {"text": "Second."}]
                        }
                    }
                },
                "references": {"User": {"u1": {"name": "Ada"}}}
            }
        })))
        .unwrap();

        assert_eq!(comment.id, "c1");
        assert_eq!(comment.url, "https://medium.com/@ada/c1");
        assert_eq!(comment.author, "Ada");
        assert_eq!(
            comment.published_at,
            Utc.timestamp_millis_opt(1_546_300_800_000).unwrap()
        );
        assert_eq!(comment.paragraphs, vec!["First.", "Second."]);
        assert!(comment.children.is_empty());
    }

    #[test]
    fn unknown_creator_is_malformed() {
        let err = CommentRecord::from_envelope(envelope(json!({
            "payload": {
                "value": {
                    "id": "c1",
                    "canonicalUrl": "https://medium.com/@ada/c1",
                    "creatorId": "ghost",
                    "firstPublishedAt": 1_546_300_800_000_i64,
                    "content": {"bodyModel": {"paragraphs": []}}
                },
                "references": {"User": {"u1": {"name": "Ada"}}}
            }
        })))
        .unwrap_err();

        assert!(matches!(err, Error::MalformedRecord(_)), "got {err:?}");
    }

    #[test]
    fn missing_value_is_malformed() {
        let err = CommentRecord::from_envelope(envelope(json!({"payload": {}}))).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));
    }

    #[test]
    fn missing_timestamp_is_malformed() {
        let err = CommentRecord::from_envelope(envelope(json!({
            "payload": {
                "value": {
                    "id": "c1",
                    "canonicalUrl": "https://medium.com/@ada/c1",
                    "creatorId": "u1",
                    "content": {"bodyModel": {"paragraphs": []}}
                },
                "references": {"User": {"u1": {"name": "Ada"}}}
            }
        })))
        .unwrap_err();

        assert!(matches!(err, Error::MalformedRecord(_)));
    }
}
