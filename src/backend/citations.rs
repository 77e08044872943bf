//! Citation lookup via an instant-answer search API (DuckDuckGo shape)
//!
//! Lookups fail soft: any network or parse error yields no citations.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;

use super::types::Citation;
use crate::error::CitationLookupError;

pub const MAX_CITATIONS: usize = 6;

#[async_trait]
pub trait CitationLookup: Send + Sync {
    /// At most `MAX_CITATIONS` results, deduplicated by url. Never fails.
    async fn search(&self, query: &str) -> Vec<Citation>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstantAnswer {
    #[serde(rename = "AbstractURL", default)]
    pub abstract_url: String,
    #[serde(default)]
    pub abstract_text: String,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelatedTopic {
    #[serde(rename = "FirstURL", default)]
    pub first_url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub topics: Vec<RelatedTopic>,
}

fn or_query(value: &str, query: &str) -> String {
    if value.is_empty() {
        query.to_string()
    } else {
        value.to_string()
    }
}

impl RelatedTopic {
    fn citation(&self, query: &str) -> Citation {
        Citation {
            title: or_query(&self.text, query),
            url: self.first_url.clone(),
            snippet: self.text.clone(),
        }
    }
}

impl InstantAnswer {
    /// Abstract first, then related topics in source order (one level of
    /// nested `Topics`), dropping empty and repeated urls, capped.
    pub fn citations(&self, query: &str) -> Vec<Citation> {
        let mut found = Vec::new();
        if !self.abstract_url.is_empty() {
            found.push(Citation {
                title: or_query(&self.heading, query),
                url: self.abstract_url.clone(),
                snippet: self.abstract_text.clone(),
            });
        }
        for topic in &self.related_topics {
            if !topic.first_url.is_empty() {
                found.push(topic.citation(query));
            } else {
                found.extend(
                    topic
                        .topics
                        .iter()
                        .filter(|nested| !nested.first_url.is_empty())
                        .map(|nested| nested.citation(query)),
                );
            }
        }

        let mut seen = HashSet::new();
        found
            .into_iter()
            .filter(|c| !c.url.is_empty() && seen.insert(c.url.clone()))
            .take(MAX_CITATIONS)
            .collect()
    }
}

pub struct InstantAnswerClient {
    client: Client,
    base_url: String,
}

impl InstantAnswerClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    async fn lookup(&self, query: &str) -> Result<InstantAnswer, CitationLookupError> {
        let raw = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .text()
            .await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl CitationLookup for InstantAnswerClient {
    async fn search(&self, query: &str) -> Vec<Citation> {
        match self.lookup(query).await {
            Ok(answer) => {
                let citations = answer.citations(query);
                tracing::debug!("Citation lookup for {:?}: {} results", query, citations.len());
                citations
            }
            Err(e) => {
                tracing::warn!("search failed: {}", e);
                Vec::new()
            }
        }
    }
}
