//! Prompt-driven fill-in engine

use crate::session::engine::{self, FillInEngine};
use crate::session::{Surface, SurfaceId};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// Stages each presented body and prompts for its placeholders when the
/// user chooses to fill the surface in.
///
/// Nothing is written until [`PromptEngine::fill`] runs, so a deferred
/// surface keeps its staged body until it comes around again.
#[derive(Debug, Default)]
pub struct PromptEngine {
    staged: Mutex<HashMap<SurfaceId, String>>,
}

impl PromptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `surface` has a body waiting to be filled in
    pub fn is_staged(&self, surface: &Surface) -> bool {
        self.staged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&surface.id())
    }

    /// Prompt for every placeholder of the staged body and write the result.
    /// Values from the fill-in environment, then inline defaults, prefill the
    /// prompts.
    pub fn fill(&self, surface: &Surface) -> Result<()> {
        let body = self
            .staged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&surface.id())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Surface {} has nothing staged", surface.id()))?;

        let env = surface.environment();
        let mut values: HashMap<String, String> = HashMap::new();
        for (name, default) in engine::fields(&body) {
            let mut input = cliclack::input(name).required(false);
            if let Some(initial) = env.get(name).or(default) {
                input = input.placeholder(initial).default_input(initial);
            }
            let value: String = input.interact()?;
            values.insert(name.to_string(), value);
        }

        let content = engine::render(&body, |name, _| {
            values.get(name).cloned().unwrap_or_default()
        });
        engine::write_output(surface.destination(), &content)?;

        self.staged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&surface.id());
        Ok(())
    }
}

impl FillInEngine for PromptEngine {
    fn render(&self, surface: &Surface, body: &str) -> Result<()> {
        self.staged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(surface.id(), body.to_string());
        Ok(())
    }

    fn resume(&self, surface: &Surface) -> Result<()> {
        if !self.is_staged(surface) {
            anyhow::bail!("Surface {} was resumed without a staged body", surface.id());
        }
        Ok(())
    }
}
