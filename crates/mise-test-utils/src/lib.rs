//! Test doubles for the Mise workspace.
//!
//! `ScriptedLlm` answers each workflow stage with a canned reply, picked by
//! recognising the stage's prompt. `StubSearch` returns fixed research
//! snippets. Both count their calls so tests can assert that nothing was
//! sent upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mise_common::{CookingError, RecipeSearch};
use mise_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};

/// Phrases that identify each stage's prompt.
pub const CLASSIFY_MARKER: &str = "Decide whether the question below is about cooking";
pub const RESEARCH_MARKER: &str = "deciding whether extra research is needed";
pub const RECIPE_MARKER: &str = "Using the research results below";

pub const PASTA_RECIPE: &str = r#"```json
{
    "name": "Spaghetti Aglio e Olio",
    "ingredients": ["spaghetti", "garlic", "olive oil", "chili flakes"],
    "steps": ["Boil pasta", "Fry garlic in oil", "Toss together"],
    "required_tools": ["little pot", "frying pan", "spoon"],
    "cooking_time": "20",
    "difficulty": "Easy",
    "servings": 2
}
```"#;

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail { status: u16, message: String },
}

impl Reply {
    fn text(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

pub struct ScriptedLlm {
    classify: Reply,
    research: Reply,
    recipe: Reply,
    answer: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    /// A model that treats every question as a cooking question answerable
    /// without research.
    pub fn cooking() -> Self {
        Self {
            classify: Reply::text("true"),
            research: Reply::text("false"),
            recipe: Reply::text(PASTA_RECIPE),
            answer: Reply::text("Boil the pasta in well-salted water until al dente."),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_classify(mut self, reply: &str) -> Self {
        self.classify = Reply::text(reply);
        self
    }

    pub fn with_research(mut self, reply: &str) -> Self {
        self.research = Reply::text(reply);
        self
    }

    pub fn with_recipe(mut self, reply: &str) -> Self {
        self.recipe = Reply::text(reply);
        self
    }

    pub fn with_answer(mut self, reply: &str) -> Self {
        self.answer = Reply::text(reply);
        self
    }

    pub fn failing_answer(mut self, status: u16, message: &str) -> Self {
        self.answer = Reply::Fail { status, message: message.to_string() };
        self
    }

    pub fn failing_classify(mut self, status: u16, message: &str) -> Self {
        self.classify = Reply::Fail { status, message: message.to_string() };
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// The prompt sent for the final answer, if the workflow got that far.
    pub fn answer_prompt(&self) -> Option<String> {
        self.prompts().into_iter().find(|p| {
            !p.contains(CLASSIFY_MARKER) && !p.contains(RESEARCH_MARKER) && !p.contains(RECIPE_MARKER)
        })
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let prompt: String = req
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let reply = if prompt.contains(CLASSIFY_MARKER) {
            &self.classify
        } else if prompt.contains(RESEARCH_MARKER) {
            &self.research
        } else if prompt.contains(RECIPE_MARKER) {
            &self.recipe
        } else {
            &self.answer
        };

        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt);
        }

        match reply {
            Reply::Text(content) => Ok(LlmResponse {
                content: content.clone(),
                model: "scripted".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            }),
            Reply::Fail { status, message } => Err(LlmError::ApiError {
                status: *status,
                message: message.clone(),
            }),
        }
    }

    fn model_id(&self) -> &str { "scripted" }
    fn is_local(&self) -> bool { true }
}

pub struct StubSearch {
    results: Vec<String>,
    fail: bool,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn returning(results: &[&str]) -> Self {
        Self {
            results: results.iter().map(|s| s.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::returning(&[])
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::empty() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecipeSearch for StubSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, CookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        if self.fail {
            return Err(CookingError::Search("connection refused".to_string()));
        }
        Ok(self.results.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str { "stub" }
}
