/// Request, answer and recipe records exchanged between the API, the
/// answering workflow and the UI. Everything here lives for one request.

use serde::{Deserialize, Serialize};

use crate::error::CookingError;

/// Upper bound on the trimmed query length accepted by default.
pub const DEFAULT_MAX_QUERY_CHARS: usize = 1000;

const NO_RESPONSE: &str = "No response generated";
const DIRECT_RESPONSE: &str = "Direct response generated";

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookingQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CookingQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), language: None }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Check the query before anything is sent upstream.
    /// Returns the trimmed query text.
    pub fn validate(&self, max_chars: usize) -> Result<String, CookingError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(CookingError::InvalidQuery("Query cannot be empty".to_string()));
        }
        let len = query.chars().count();
        if len > max_chars {
            return Err(CookingError::InvalidQuery(format!(
                "Query is {len} characters long; the limit is {max_chars}"
            )));
        }
        if let Some(lang) = &self.language {
            if !is_language_tag(lang) {
                return Err(CookingError::InvalidQuery(format!(
                    "Unsupported language tag: {lang:?}"
                )));
            }
        }
        Ok(query.to_string())
    }
}

/// Loose BCP-47 shape check: `en`, `pt-BR`, `zh-Hant-TW`.
fn is_language_tag(tag: &str) -> bool {
    (2..=35).contains(&tag.len())
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !tag.starts_with('-')
        && !tag.ends_with('-')
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookingResponse {
    pub response: String,
    #[serde(default)]
    pub relevant: bool,
    #[serde(default)]
    pub reasoning_chain: Vec<String>,
}

impl CookingResponse {
    /// Build a normalised answer: the text is never empty and the
    /// reasoning chain always has at least one step.
    pub fn new(response: impl Into<String>, relevant: bool, reasoning_chain: Vec<String>) -> Self {
        let response = response.into();
        let response = match response.trim() {
            "" => NO_RESPONSE.to_string(),
            trimmed => trimmed.to_string(),
        };

        let mut chain: Vec<String> = reasoning_chain
            .into_iter()
            .map(|step| step.trim().to_string())
            .filter(|step| !step.is_empty())
            .collect();
        if chain.is_empty() {
            chain.push(DIRECT_RESPONSE.to_string());
        }

        Self { response, relevant, reasoning_chain: chain }
    }

    /// Answer-shaped body describing a failed request.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            format!("Error processing query: {message}"),
            false,
            vec!["Error occurred".to_string(), message],
        )
    }
}

impl From<AgentState> for CookingResponse {
    fn from(state: AgentState) -> Self {
        CookingResponse::new(
            state.final_response.unwrap_or_default(),
            state.is_cooking_related,
            state.reasoning_chain,
        )
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = CookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(CookingError::InvalidRecipe(format!(
                "Difficulty must be one of: easy, medium, hard (got {other:?})"
            ))),
        }
    }
}

/// Recipe as the model emits it, before validation.
#[derive(Debug, Deserialize)]
struct RecipeDraft {
    name: String,
    ingredients: Vec<String>,
    steps: Vec<String>,
    required_tools: Vec<String>,
    cooking_time: String,
    difficulty: String,
    servings: Servings,
}

/// Models write servings as `2`, `2.0` or `"2"`; all mean the same thing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Servings {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Servings {
    fn count(&self) -> Option<u32> {
        let n = match self {
            Servings::Int(n) => *n,
            Servings::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
            Servings::Float(_) => return None,
            Servings::Text(s) => s.trim().parse().ok()?,
        };
        u32::try_from(n).ok().filter(|n| *n >= 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecipeDraft")]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub required_tools: Vec<String>,
    pub cooking_time: String,
    pub difficulty: Difficulty,
    pub servings: u32,
}

impl TryFrom<RecipeDraft> for Recipe {
    type Error = CookingError;

    fn try_from(draft: RecipeDraft) -> Result<Self, Self::Error> {
        let difficulty = draft.difficulty.parse()?;

        let servings = draft
            .servings
            .count()
            .ok_or_else(|| CookingError::InvalidRecipe("Servings must be a positive whole number".to_string()))?;

        let mut cooking_time = draft.cooking_time.trim().to_string();
        if !cooking_time.ends_with("minutes") {
            cooking_time.push_str(" minutes");
        }

        Ok(Self {
            name: draft.name,
            ingredients: draft.ingredients,
            steps: draft.steps,
            required_tools: draft.required_tools,
            cooking_time,
            difficulty,
            servings,
        })
    }
}

impl Recipe {
    /// Parse and validate a recipe from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CookingError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Kitchen tools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenToolSet {
    pub available_tools: Vec<String>,
}

impl Default for KitchenToolSet {
    fn default() -> Self {
        Self {
            available_tools: [
                "Spatula",
                "Frying Pan",
                "Little Pot",
                "Stovetop",
                "Whisk",
                "Knife",
                "Ladle",
                "Spoon",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl KitchenToolSet {
    pub fn new(available_tools: Vec<String>) -> Self {
        Self { available_tools }
    }

    /// Whether every tool the recipe needs is in the kitchen.
    /// Names compare case-insensitively; no recipe means nothing is missing.
    pub fn can_cook(&self, recipe: Option<&Recipe>) -> bool {
        self.missing_tools(recipe).is_empty()
    }

    pub fn missing_tools(&self, recipe: Option<&Recipe>) -> Vec<String> {
        let Some(recipe) = recipe else { return Vec::new() };
        recipe
            .required_tools
            .iter()
            .filter(|needed| {
                !self
                    .available_tools
                    .iter()
                    .any(|have| have.to_lowercase() == needed.to_lowercase())
            })
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Workflow state
// ---------------------------------------------------------------------------

/// State threaded through the answering stages of a single request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentState {
    pub query: String,
    pub language: Option<String>,
    pub is_cooking_related: bool,
    pub needs_research: bool,
    pub research_results: Vec<String>,
    pub recipe: Option<Recipe>,
    pub reasoning_chain: Vec<String>,
    pub final_response: Option<String>,
}

impl AgentState {
    pub fn new(query: impl Into<String>, language: Option<String>) -> Self {
        Self { query: query.into(), language, ..Default::default() }
    }

    pub fn record(&mut self, step: impl Into<String>) {
        self.reasoning_chain.push(step.into());
    }
}
