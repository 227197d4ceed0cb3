use crate::recognition::Listener;
use crate::registry::HandlerRegistry;
use crate::resolver::{is_exit, normalize_keyword, resolve, resolve_approximate};
use anyhow::Result;
use shared::config::Config;
use shared::handler::{CommandArgs, Handler};
use shared::speech::Speak;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    WaitingWake,
    Woken,
    AwaitingCommand,
    CommandResolved,
    CommandUnknown,
    AwaitingArgs,
    Executing,
    Speaking,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed {
        keyword: String,
        response: String,
        failed: bool,
    },
    Unrecognized {
        keyword: String,
    },
    Shutdown,
}

pub fn transition_label(from: DispatchState, to: DispatchState) -> String {
    format!("{:?} -> {:?}", from, to)
}

/// What running a handler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Succeeded(String),
    Failed(String),
}

impl Execution {
    pub fn response(&self) -> &str {
        match self {
            Self::Succeeded(text) | Self::Failed(text) => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    pub assistant_name: String,
    /// Minimum similarity for approximate keyword resolution; `None` keeps
    /// lookup exact.
    pub fuzzy_threshold: Option<u8>,
}

impl DispatchOptions {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            fuzzy_threshold: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            assistant_name: config.assistant.name.clone(),
            fuzzy_threshold: config
                .assistant
                .fuzzy_commands
                .then_some(config.assistant.fuzzy_threshold),
        }
    }
}

/// Runs a handler on its own task so that an error or a panic comes back as
/// a spoken failure instead of ending the loop.
pub async fn execute(keyword: &str, handler: Arc<dyn Handler>, args: CommandArgs) -> Execution {
    let task = tokio::spawn(async move { handler.handle(args).await });
    match task.await {
        Ok(Ok(response)) => Execution::Succeeded(response),
        Ok(Err(e)) => {
            error!("Handler for '{}' failed: {}", keyword, e);
            Execution::Failed(format!("Error executing '{}': {}", keyword, e))
        }
        Err(e) if e.is_panic() => {
            error!("Handler for '{}' panicked", keyword);
            Execution::Failed(format!("Error executing '{}': handler panicked", keyword))
        }
        Err(e) => Execution::Failed(format!("Error executing '{}': {}", keyword, e)),
    }
}

/// The wake, command, arguments, execute, speak cycle. One command is in
/// flight at a time; a new wake phrase is only heard once the previous
/// response has been spoken.
pub struct Dispatcher<L> {
    listener: L,
    registry: Arc<HandlerRegistry>,
    speaker: Arc<dyn Speak>,
    options: DispatchOptions,
    state: DispatchState,
}

impl<L: Listener> Dispatcher<L> {
    pub fn new(
        listener: L,
        registry: Arc<HandlerRegistry>,
        speaker: Arc<dyn Speak>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            listener,
            registry,
            speaker,
            options,
            state: DispatchState::WaitingWake,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Announces readiness, then cycles until an exit keyword is heard.
    pub async fn run(&mut self) -> Result<()> {
        self.speaker
            .speak(&format!(
                "{} is ready. Say one of your wake words to wake me.",
                self.options.assistant_name
            ))
            .await;

        loop {
            if self.run_cycle().await? == CycleOutcome::Shutdown {
                info!("Exit keyword heard, shutting down");
                return Ok(());
            }
        }
    }

    /// One full cycle. Only listener failures are returned as errors.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.transition(DispatchState::WaitingWake);
        let wake_txt = self.listener.wait_for_wake().await?;
        println!("[WAKE]: {}", wake_txt);

        self.transition(DispatchState::Woken);
        self.speaker.speak("Yes?").await;

        self.transition(DispatchState::AwaitingCommand);
        let cmd_txt = self.listener.wait_for_command().await?;
        println!("[COMMAND KEYWORD]: {}", cmd_txt);
        let keyword = normalize_keyword(&cmd_txt);

        if is_exit(&keyword) {
            self.transition(DispatchState::CommandResolved);
            self.transition(DispatchState::Shutdown);
            return Ok(CycleOutcome::Shutdown);
        }

        let Some((resolved, handler)) = self.lookup(&keyword) else {
            self.transition(DispatchState::CommandUnknown);
            self.speaker
                .speak(&format!("Command '{}' not recognized.", keyword))
                .await;
            self.transition(DispatchState::WaitingWake);
            return Ok(CycleOutcome::Unrecognized { keyword });
        };
        self.transition(DispatchState::CommandResolved);

        self.transition(DispatchState::AwaitingArgs);
        self.speaker
            .speak(&format!(
                "What would you like {} to do for '{}'?",
                self.options.assistant_name, resolved
            ))
            .await;
        let args_txt = self.listener.listen_full().await?;
        println!("[ARGS]: {}", args_txt);
        let args = CommandArgs::from_text(args_txt);

        self.transition(DispatchState::Executing);
        let execution = execute(&resolved, handler, args).await;

        self.transition(DispatchState::Speaking);
        self.speaker.speak(execution.response()).await;

        self.transition(DispatchState::WaitingWake);
        Ok(CycleOutcome::Completed {
            failed: execution.is_failure(),
            response: match execution {
                Execution::Succeeded(text) | Execution::Failed(text) => text,
            },
            keyword: resolved,
        })
    }

    fn lookup(&self, keyword: &str) -> Option<(String, Arc<dyn Handler>)> {
        if let Some(entry) = resolve(keyword, &self.registry) {
            return Some((entry.keyword.clone(), Arc::clone(&entry.handler)));
        }

        let threshold = self.options.fuzzy_threshold?;
        let (entry, score) = resolve_approximate(keyword, &self.registry, threshold)?;
        info!(
            "Resolved '{}' to '{}' ({}% similar)",
            keyword, entry.keyword, score
        );
        Some((entry.keyword.clone(), Arc::clone(&entry.handler)))
    }

    fn transition(&mut self, next: DispatchState) {
        if self.state != next {
            debug!("State transition: {}", transition_label(self.state, next));
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::handler::{handler_fn, HandlerError};

    #[tokio::test]
    async fn test_execute_success() {
        let handler = handler_fn(|args| Ok(format!("{} params", args.params.len())));
        let execution = execute("count", handler, CommandArgs::from_text("a b")).await;
        assert_eq!(execution, Execution::Succeeded("2 params".to_string()));
        assert!(!execution.is_failure());
    }

    #[tokio::test]
    async fn test_execute_isolates_errors() {
        let handler = handler_fn(|_| Err(HandlerError::failed("API key missing")));
        let execution = execute("weather", handler, CommandArgs::default()).await;
        assert_eq!(
            execution,
            Execution::Failed("Error executing 'weather': API key missing".to_string())
        );
    }

    #[tokio::test]
    async fn test_execute_isolates_panics() {
        let handler = handler_fn(|args| {
            let first = &args.params[0];
            Ok(first.clone())
        });
        let execution = execute("echo", handler, CommandArgs::default()).await;
        assert!(execution.is_failure());
        assert_eq!(
            execution.response(),
            "Error executing 'echo': handler panicked"
        );
    }

    #[test]
    fn test_transition_label() {
        let label = transition_label(DispatchState::WaitingWake, DispatchState::Woken);
        assert_eq!(label, "WaitingWake -> Woken");
        assert!(label.is_ascii());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        assert_eq!(DispatchOptions::from_config(&config), DispatchOptions::new("duck"));

        config.assistant.fuzzy_commands = true;
        config.assistant.fuzzy_threshold = 80;
        assert_eq!(
            DispatchOptions::from_config(&config).fuzzy_threshold,
            Some(80)
        );
    }
}
