//! Test helper utilities
//!
//! Shared fixtures for tunesift-ident integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tunesift_ident::models::{Item, Outcome, Payload};
use tunesift_ident::services::RecognitionProvider;

/// Provider returning scripted outcomes and recording every call
pub struct ScriptedProvider {
    name: String,
    script: HashMap<Item, Outcome>,
    calls: Mutex<Vec<Item>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedProvider {
    /// Provider that misses on every unscripted item
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    pub fn on(mut self, item: &str, outcome: Outcome) -> Self {
        self.script.insert(Item::from(item), outcome);
        self
    }

    pub fn hit(self, item: &str) -> Self {
        let payload = payload_for(&self.name, item);
        self.on(item, Outcome::Hit(payload))
    }

    /// Fire `token` once `calls` calls have completed
    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> Vec<Item> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called_with(&self, item: &str) -> bool {
        self.calls().contains(&Item::from(item))
    }
}

#[async_trait]
impl RecognitionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn identify(&self, item: &Item) -> Outcome {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(item.clone());
            calls.len()
        };

        let outcome = self.script.get(item).cloned().unwrap_or(Outcome::Miss);

        if let Some((limit, token)) = &self.cancel_after {
            if count >= *limit {
                token.cancel();
            }
        }
        outcome
    }
}

/// Payload a scripted provider returns for `item`
pub fn payload_for(provider: &str, item: &str) -> Payload {
    Payload::new()
        .with("title", format!("{} title", item))
        .with("source", provider.to_string())
}

pub fn items(names: &[&str]) -> Vec<Item> {
    names.iter().map(|n| Item::from(*n)).collect()
}
