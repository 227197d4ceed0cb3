// Common test helpers for echoduck dispatch tests
//
// This module provides:
// - A listener that replays scripted recognition results
// - A speaker that records everything it is asked to say
// - Small builders for registries

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use echoduck::{HandlerRegistry, Listener, RegistryBuilder};
use shared::handler::Handler;
use shared::speech::Speak;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Replays one queue per listening phase. An empty queue fails the call,
/// which ends a dispatch loop the same way a closed audio stream would.
#[derive(Default)]
pub struct ScriptedListener {
    wakes: VecDeque<String>,
    commands: VecDeque<String>,
    args: VecDeque<String>,
    pub listen_full_calls: usize,
}

impl ScriptedListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one full cycle.
    pub fn cycle(mut self, wake: &str, command: &str, args: Option<&str>) -> Self {
        self.wakes.push_back(wake.to_string());
        self.commands.push_back(command.to_string());
        if let Some(args) = args {
            self.args.push_back(args.to_string());
        }
        self
    }
}

fn next(queue: &mut VecDeque<String>, phase: &str) -> Result<String> {
    queue
        .pop_front()
        .ok_or_else(|| anyhow::anyhow!("script exhausted waiting for {}", phase))
}

#[async_trait]
impl Listener for ScriptedListener {
    async fn wait_for_wake(&mut self) -> Result<String> {
        next(&mut self.wakes, "wake")
    }

    async fn wait_for_command(&mut self) -> Result<String> {
        next(&mut self.commands, "command")
    }

    async fn listen_full(&mut self) -> Result<String> {
        self.listen_full_calls += 1;
        next(&mut self.args, "args")
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Speak for RecordingSpeaker {
    async fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

pub fn registry(entries: Vec<(&str, Arc<dyn Handler>)>) -> Arc<HandlerRegistry> {
    let mut builder = RegistryBuilder::new();
    for (keyword, handler) in entries {
        builder.insert("test", keyword, handler);
    }
    Arc::new(builder.build())
}

/// Ask user to confirm an action
pub fn confirm_action(prompt: &str) -> bool {
    print!(
        "\n[CONFIRM] {}\nPress 'y' to confirm, any other key to skip: ",
        prompt
    );
    io::stdout().flush().unwrap();

    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();

    input.trim().to_lowercase() == "y"
}

/// Print a section header
pub fn print_header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {}", title);
    println!("{}", "=".repeat(60));
}

pub fn print_info(message: &str) {
    println!("\nℹ {}", message);
}
