//! The answering workflow.
//!
//! Five stages run in a fixed order over a per-request `AgentState`:
//!
//!   classify → check_research → research → parse → respond
//!
//! Every stage may skip itself based on what earlier stages decided, and
//! each decision is appended to the state's reasoning chain. Nothing is
//! shared between requests.

use std::sync::Arc;

use mise_common::{
    AgentState, CookingError, CookingQuery, CookingResponse, KitchenToolSet, Recipe, RecipeSearch,
};
use mise_llm::{LlmBackend, LlmRequest};
use tracing::{debug, info, warn};

use crate::prompts::Prompts;

pub const NOT_COOKING_REPLY: &str = "I apologize, but I can only help with cooking-related questions. \
Please ask me about recipes, cooking techniques, or kitchen tools.";

const HOW_TO_COOK: &str = "how to cook";

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub research_enabled: bool,
    pub max_research_results: usize,
    pub max_query_chars: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            temperature: mise_llm::backend::DEFAULT_TEMPERATURE,
            max_tokens: mise_llm::backend::DEFAULT_MAX_TOKENS,
            research_enabled: true,
            max_research_results: 3,
            max_query_chars: mise_common::models::DEFAULT_MAX_QUERY_CHARS,
        }
    }
}

pub struct CookingWorkflow {
    llm: Arc<dyn LlmBackend>,
    search: Arc<dyn RecipeSearch>,
    prompts: Prompts,
    toolset: KitchenToolSet,
    settings: WorkflowSettings,
}

impl CookingWorkflow {
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        search: Arc<dyn RecipeSearch>,
        toolset: KitchenToolSet,
        settings: WorkflowSettings,
    ) -> Result<Self, CookingError> {
        info!(
            model = llm.model_id(),
            is_local = llm.is_local(),
            search = search.name(),
            research = settings.research_enabled,
            "Cooking workflow created"
        );
        Ok(Self { llm, search, prompts: Prompts::new()?, toolset, settings })
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Validate a query, run every stage and build the answer record.
    /// Invalid queries are rejected before any model call.
    pub async fn answer(&self, query: &CookingQuery) -> Result<CookingResponse, CookingError> {
        let text = query.validate(self.settings.max_query_chars)?;
        let state = self.run(&text, query.language.clone()).await?;
        Ok(CookingResponse::from(state))
    }

    /// Run all stages for an already validated query.
    pub async fn run(&self, query: &str, language: Option<String>) -> Result<AgentState, CookingError> {
        let mut state = AgentState::new(query, language);
        debug!(query = %state.query, "Starting workflow");

        self.classify(&mut state).await?;
        self.check_research(&mut state).await?;
        self.research(&mut state).await;
        self.parse(&mut state).await?;
        self.respond(&mut state).await?;

        debug!(steps = state.reasoning_chain.len(), "Workflow finished");
        Ok(state)
    }

    // ── Stages ───────────────────────────────────────────────────────────────

    async fn classify(&self, state: &mut AgentState) -> Result<(), CookingError> {
        info!(query = %state.query, "Classifying query");
        let reply = self.ask(self.prompts.classify(&state.query)?).await?;
        state.is_cooking_related = parse_bool_reply(&reply);

        let label = if state.is_cooking_related { "cooking-related" } else { "not cooking-related" };
        state.record(format!("Query classification: {label}"));
        info!(label, "Query classified");
        Ok(())
    }

    async fn check_research(&self, state: &mut AgentState) -> Result<(), CookingError> {
        if !state.is_cooking_related {
            debug!("Skipping research check for non-cooking query");
            return Ok(());
        }
        if !self.settings.research_enabled {
            state.record("Research skipped (disabled)");
            return Ok(());
        }

        let reply = self.ask(self.prompts.research_needed(&state.query)?).await?;
        state.needs_research = parse_bool_reply(&reply);
        state.record(if state.needs_research { "Research needed" } else { "Research not needed" });
        info!(needs_research = state.needs_research, "Research check done");
        Ok(())
    }

    /// Search failures degrade to "no results"; the answer can still be
    /// written from the model's own knowledge.
    async fn research(&self, state: &mut AgentState) {
        if !state.needs_research {
            return;
        }

        let query = format!("recipe {}", state.query);
        let results = match self.search.search(&query, self.settings.max_research_results).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, search = self.search.name(), "Recipe search failed");
                Vec::new()
            }
        };

        if results.is_empty() {
            warn!("No research results found");
            return;
        }

        info!(n = results.len(), "Research results found");
        state.research_results = results;
        state.record("Performed recipe research");
    }

    async fn parse(&self, state: &mut AgentState) -> Result<(), CookingError> {
        if state.research_results.is_empty() {
            return Ok(());
        }

        let reply = self.ask(self.prompts.recipe_parser(&state.research_results)?).await?;
        state.recipe = match Recipe::from_json(strip_code_fence(&reply)) {
            Ok(recipe) => Some(recipe),
            Err(e) => {
                warn!(error = %e, "Could not parse recipe from model output");
                None
            }
        };

        state.record(if state.recipe.is_some() {
            "Recipe parsed successfully"
        } else {
            "Recipe parsing failed"
        });
        Ok(())
    }

    async fn respond(&self, state: &mut AgentState) -> Result<(), CookingError> {
        if !state.is_cooking_related {
            state.final_response = Some(NOT_COOKING_REPLY.to_string());
            return Ok(());
        }

        let language = state.language.as_deref();
        let prompt = match &state.recipe {
            Some(recipe) => self.prompts.final_response(&state.query, recipe, &self.toolset, language)?,
            None => {
                let lowered = state.query.to_lowercase();
                if lowered.contains(HOW_TO_COOK) {
                    let dish = lowered.replace("how to cook ", "");
                    self.prompts.basic_instructions(dish.trim(), &self.toolset, language)?
                } else {
                    self.prompts.general_cooking(&state.query, language)?
                }
            }
        };

        let reply = self.ask(prompt).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(CookingError::EmptyResponse);
        }

        state.final_response = Some(reply.to_string());
        state.record("Generated final response");
        info!(chars = reply.len(), "Response generated");
        Ok(())
    }

    async fn ask(&self, prompt: String) -> Result<String, CookingError> {
        let req = LlmRequest::prompt(prompt)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        self.llm
            .complete(req)
            .await
            .map(|resp| resp.content)
            .map_err(|e| CookingError::Upstream(e.to_string()))
    }
}

/// The classifier prompts ask for a bare `true` / `false`.
pub fn parse_bool_reply(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case("true")
}

/// Strip a surrounding markdown code fence (```` ```json ```` or ```` ``` ````).
pub fn strip_code_fence(reply: &str) -> &str {
    let mut s = reply.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}
