use crate::launcher;
use async_trait::async_trait;
use shared::handler::{CommandArgs, Handler, HandlerResult};
use shared::plugin::{Plugin, PluginContext, Registration};
use shared::speech::Speak;
use std::sync::Arc;

const SITES: [(&str, &str); 7] = [
    ("google", "https://www.google.com"),
    ("youtube", "https://www.youtube.com"),
    ("github", "https://www.github.com"),
    ("duckduckgo", "https://www.duckduckgo.com"),
    ("wikipedia", "https://www.wikipedia.org"),
    ("facebook", "https://www.facebook.com"),
    ("reddit", "https://www.reddit.com"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Site(String),
    Search { query: String, url: String },
}

impl Target {
    pub fn url(&self) -> &str {
        match self {
            Self::Site(url) => url,
            Self::Search { url, .. } => url,
        }
    }
}

/// A known site name, a literal URL, or else a web search for the words.
pub fn resolve_target(args: &CommandArgs) -> Option<Target> {
    let first = args.params.first()?;
    let name = first.to_lowercase();

    if let Some((_, url)) = SITES.iter().find(|(site, _)| *site == name) {
        return Some(Target::Site(url.to_string()));
    }
    if name.starts_with("http://") || name.starts_with("https://") {
        return Some(Target::Site(first.clone()));
    }

    let query = args.joined();
    let url = format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(&query)
    );
    Some(Target::Search { query, url })
}

pub struct WebsitePlugin;

impl Plugin for WebsitePlugin {
    fn name(&self) -> &'static str {
        "website"
    }

    fn register(&self, ctx: &PluginContext) -> Registration {
        let handler = WebsiteHandler {
            speaker: Arc::clone(&ctx.speaker),
        };
        Registration::new().with(
            &["web", "website", "open", "go", "search", "browse", "visit"],
            Arc::new(handler),
        )
    }
}

pub struct WebsiteHandler {
    speaker: Arc<dyn Speak>,
}

#[async_trait]
impl Handler for WebsiteHandler {
    async fn handle(&self, args: CommandArgs) -> HandlerResult {
        let Some(target) = resolve_target(&args) else {
            return Ok("Please provide a URL to open.".to_string());
        };

        if let Target::Search { query, .. } = &target {
            self.speaker
                .speak(&format!(
                    "Searching for {} on Google and opening results.",
                    query
                ))
                .await;
        }

        if let Err(e) = launcher::open(target.url()) {
            return Ok(format!("Error opening website: {}", e));
        }
        Ok(format!("Opened website: {}", target.url()))
    }
}
