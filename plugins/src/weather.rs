//! Current conditions from OpenWeatherMap.
//!
//! ```toml
//! [weather]
//! apikey = "..."
//! units = "metric"
//! default_city = "Paris"
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shared::config::ConfigStore;
use shared::handler::{CommandArgs, Handler, HandlerResult};
use shared::plugin::{Plugin, PluginContext, Registration};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WeatherSettings {
    #[serde(default)]
    pub apikey: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default)]
    pub default_city: String,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            apikey: String::new(),
            units: default_units(),
            default_city: String::new(),
        }
    }
}

fn default_units() -> String {
    "metric".to_string()
}

pub struct WeatherPlugin;

impl Plugin for WeatherPlugin {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn register(&self, ctx: &PluginContext) -> Registration {
        let handler = WeatherHandler {
            config: Arc::clone(&ctx.config),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|e| {
                    warn!("Falling back to default HTTP client: {}", e);
                    reqwest::Client::new()
                }),
        };
        Registration::new().with(&["weather", "forecast"], Arc::new(handler))
    }
}

pub struct WeatherHandler {
    config: Arc<ConfigStore>,
    client: reqwest::Client,
}

impl WeatherHandler {
    async fn fetch(&self, city: &str, settings: &WeatherSettings) -> Result<Value, reqwest::Error> {
        // Error replies carry a JSON body too, so the status is not checked here.
        self.client
            .get(ENDPOINT)
            .query(&[
                ("q", city),
                ("appid", settings.apikey.as_str()),
                ("units", settings.units.as_str()),
                ("lang", "en"),
            ])
            .send()
            .await?
            .json::<Value>()
            .await
    }
}

#[async_trait]
impl Handler for WeatherHandler {
    async fn handle(&self, args: CommandArgs) -> HandlerResult {
        let settings: WeatherSettings = self.config.snapshot().section("weather");
        if settings.apikey.is_empty() {
            return Ok("Weather API key is not configured.".to_string());
        }

        let city = if args.is_empty() {
            settings.default_city.clone()
        } else {
            args.joined()
        };
        if city.is_empty() {
            return Ok("Please provide a city name for the weather.".to_string());
        }

        debug!("Fetching weather for {}", city);
        let data = match self.fetch(&city, &settings).await {
            Ok(data) => data,
            Err(e) => return Ok(format!("Error fetching weather data: {}", e)),
        };

        Ok(describe(&city, &data))
    }
}

/// Turns an OpenWeatherMap reply into a sentence.
pub fn describe(city: &str, data: &Value) -> String {
    let ok = match &data["cod"] {
        Value::Number(n) => n.as_u64() == Some(200),
        Value::String(s) => s == "200",
        _ => false,
    };
    if !ok {
        let message = data["message"].as_str().unwrap_or("unknown error");
        return format!("Could not get weather for '{}': {}.", city, capitalize(message));
    }

    let description = data["weather"][0]["description"]
        .as_str()
        .unwrap_or("unknown conditions");
    let main = &data["main"];
    let wind = match &data["wind"]["speed"] {
        Value::Null => "N/A".to_string(),
        speed => speed.to_string(),
    };

    format!(
        "Weather in {}: {}, temp {}°, feels like {}°, humidity {}%, wind {} m/s.",
        city, description, main["temp"], main["feels_like"], main["humidity"], wind
    )
}

/// Upper-cases the first letter and lower-cases the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
