use crate::numbers::parse_spoken_number;
use async_trait::async_trait;
use shared::handler::{CommandArgs, Handler, HandlerResult};
use shared::plugin::{Plugin, PluginContext, Registration};
use shared::speech::Speak;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct TimerPlugin;

impl Plugin for TimerPlugin {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn register(&self, ctx: &PluginContext) -> Registration {
        let handler = TimerHandler {
            speaker: Arc::clone(&ctx.speaker),
        };
        Registration::new().with(&["timer", "countdown"], Arc::new(handler))
    }
}

/// Schedules a spoken reminder and returns immediately. Reminders go through
/// the shared speaker, so one that fires mid-sentence waits its turn.
pub struct TimerHandler {
    speaker: Arc<dyn Speak>,
}

#[async_trait]
impl Handler for TimerHandler {
    async fn handle(&self, args: CommandArgs) -> HandlerResult {
        if args.is_empty() {
            return Ok("Please specify a duration in minutes, e.g. 'timer five'.".to_string());
        }

        let spoken = args.joined();
        let invalid = || {
            format!(
                "Invalid duration '{}'. Please give a number of minutes.",
                spoken
            )
        };
        let Some(minutes) = parse_spoken_number(&spoken) else {
            return Ok(invalid());
        };
        if minutes <= 0.0 || !minutes.is_finite() {
            return Ok("Please provide a positive number of minutes.".to_string());
        }
        let Ok(delay) = Duration::try_from_secs_f64(minutes * 60.0) else {
            return Ok(invalid());
        };

        let label = minutes_label(minutes);
        info!("Timer set for {}", label);

        let speaker = Arc::clone(&self.speaker);
        let announcement = format!("Timer for {} is up!", label);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            speaker.speak(&announcement).await;
        });

        Ok(format!("Timer set for {}.", label))
    }
}

/// "1 minute", "5 minutes", "2.5 minutes".
pub fn minutes_label(minutes: f64) -> String {
    let unit = if minutes == 1.0 { "minute" } else { "minutes" };
    if minutes.fract() == 0.0 {
        format!("{} {}", minutes as u64, unit)
    } else {
        format!("{} {}", minutes, unit)
    }
}
