//! Spoken Wikipedia summaries from the REST page-summary endpoint.

use async_trait::async_trait;
use serde_json::Value;
use shared::handler::{CommandArgs, Handler, HandlerResult};
use shared::plugin::{Plugin, PluginContext, Registration};
use shared::speech::Speak;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const SUMMARY_ENDPOINT: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const SEARCH_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const SENTENCES: usize = 2;
const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Summary(String),
    Disambiguation,
    Missing,
}

pub struct WikipediaPlugin;

impl Plugin for WikipediaPlugin {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    fn register(&self, ctx: &PluginContext) -> Registration {
        let client = reqwest::Client::builder()
            .user_agent(concat!("echoduck/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        let handler = WikipediaHandler {
            speaker: Arc::clone(&ctx.speaker),
            client,
        };
        Registration::new().with(&["wiki", "wikipedia"], Arc::new(handler))
    }
}

pub struct WikipediaHandler {
    speaker: Arc<dyn Speak>,
    client: reqwest::Client,
}

impl WikipediaHandler {
    async fn summary(&self, query: &str) -> Result<Lookup, reqwest::Error> {
        let title = query.replace(' ', "_");
        let url = format!("{}/{}", SUMMARY_ENDPOINT, urlencoding::encode(&title));
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await?;
        Ok(interpret_summary(status, &body))
    }

    async fn suggestions(&self, query: &str) -> Result<Vec<String>, reqwest::Error> {
        let limit = (MAX_SUGGESTIONS + 1).to_string();
        let body = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", limit.as_str()),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .send()
            .await?
            .json::<Value>()
            .await?;
        Ok(parse_suggestions(query, &body, MAX_SUGGESTIONS))
    }

    async fn answer(&self, query: &str) -> Result<String, reqwest::Error> {
        match self.summary(query).await? {
            Lookup::Summary(text) => Ok(text),
            Lookup::Missing => Ok(format!("I couldn't find a page for '{}'.", query)),
            Lookup::Disambiguation => {
                let options = self.suggestions(query).await?;
                Ok(format!(
                    "Multiple results found for '{}'. Did you mean: {}?",
                    query,
                    options.join(", ")
                ))
            }
        }
    }
}

#[async_trait]
impl Handler for WikipediaHandler {
    async fn handle(&self, args: CommandArgs) -> HandlerResult {
        if args.is_empty() {
            return Ok("Please provide a search term for Wikipedia.".to_string());
        }
        let query = args.joined();
        self.speaker.speak("Searching Wikipedia...").await;

        debug!("Looking up '{}' on Wikipedia", query);
        match self.answer(&query).await {
            Ok(text) => Ok(text),
            Err(e) => Ok(format!(
                "An error occurred while searching Wikipedia: {}",
                e
            )),
        }
    }
}

pub fn interpret_summary(status: u16, body: &Value) -> Lookup {
    if status == 404 {
        return Lookup::Missing;
    }
    match body["type"].as_str() {
        Some("disambiguation") => Lookup::Disambiguation,
        _ => match body["extract"].as_str() {
            Some(extract) if !extract.trim().is_empty() => {
                Lookup::Summary(first_sentences(extract, SENTENCES))
            }
            _ => Lookup::Missing,
        },
    }
}

/// The leading `count` sentences of `text`.
pub fn first_sentences(text: &str, count: usize) -> String {
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                seen += 1;
                if seen == count {
                    return text[..i + c.len_utf8()].trim().to_string();
                }
            }
        }
    }
    text.trim().to_string()
}

/// Titles from an opensearch reply, skipping the query's own page.
pub fn parse_suggestions(query: &str, body: &Value, limit: usize) -> Vec<String> {
    body[1]
        .as_array()
        .map(|titles| {
            titles
                .iter()
                .filter_map(Value::as_str)
                .filter(|title| !title.eq_ignore_ascii_case(query))
                .take(limit)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
