//! Prompt templates for every model call the workflow makes.
//!
//! Templates live in `templates/*.txt` and are compiled into the binary.
//! Undefined variables are errors, so a renamed field fails loudly in tests
//! instead of producing a half-empty prompt.

use minijinja::{context, Environment, UndefinedBehavior};
use mise_common::{CookingError, KitchenToolSet, Recipe};

const CLASSIFY: &str = "classify.txt";
const RESEARCH_NEEDED: &str = "research_needed.txt";
const RECIPE_PARSER: &str = "recipe_parser.txt";
const FINAL_RESPONSE: &str = "final_response.txt";
const GENERAL_COOKING: &str = "general_cooking.txt";
const BASIC_INSTRUCTIONS: &str = "basic_instructions.txt";

const TEMPLATES: &[(&str, &str)] = &[
    (CLASSIFY, include_str!("../templates/classify.txt")),
    (RESEARCH_NEEDED, include_str!("../templates/research_needed.txt")),
    (RECIPE_PARSER, include_str!("../templates/recipe_parser.txt")),
    (FINAL_RESPONSE, include_str!("../templates/final_response.txt")),
    (GENERAL_COOKING, include_str!("../templates/general_cooking.txt")),
    (BASIC_INSTRUCTIONS, include_str!("../templates/basic_instructions.txt")),
];

pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self, CookingError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| CookingError::Prompt(e.to_string()))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, CookingError> {
        self.env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(|e| CookingError::Prompt(format!("{name}: {e}")))
    }

    pub fn classify(&self, query: &str) -> Result<String, CookingError> {
        self.render(CLASSIFY, context! { query })
    }

    pub fn research_needed(&self, query: &str) -> Result<String, CookingError> {
        self.render(RESEARCH_NEEDED, context! { query })
    }

    pub fn recipe_parser(&self, research_results: &[String]) -> Result<String, CookingError> {
        self.render(RECIPE_PARSER, context! { research_results => research_results.join("\n") })
    }

    pub fn final_response(
        &self,
        query: &str,
        recipe: &Recipe,
        tools: &KitchenToolSet,
        language: Option<&str>,
    ) -> Result<String, CookingError> {
        let recipe_json = serde_json::to_string(recipe)?;
        self.render(
            FINAL_RESPONSE,
            context! {
                query,
                recipe => recipe_json,
                can_cook => tools.can_cook(Some(recipe)),
                available_tools => &tools.available_tools,
                missing_tools => tools.missing_tools(Some(recipe)),
                language,
            },
        )
    }

    pub fn general_cooking(&self, query: &str, language: Option<&str>) -> Result<String, CookingError> {
        self.render(GENERAL_COOKING, context! { query, language })
    }

    pub fn basic_instructions(
        &self,
        dish: &str,
        tools: &KitchenToolSet,
        language: Option<&str>,
    ) -> Result<String, CookingError> {
        self.render(
            BASIC_INSTRUCTIONS,
            context! { dish, available_tools => &tools.available_tools, language },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Recipe {
        Recipe::from_json(
            r#"{"name": "Omelette", "ingredients": ["eggs", "butter"],
                "steps": ["Whisk eggs", "Cook in butter"],
                "required_tools": ["whisk", "frying pan", "oven"],
                "cooking_time": "10", "difficulty": "easy", "servings": 1}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_all_templates_compile() {
        assert!(Prompts::new().is_ok());
    }

    #[test]
    fn test_classify_embeds_query() {
        let p = Prompts::new().unwrap();
        let out = p.classify("How long do I boil an egg?").unwrap();
        assert!(out.contains("Question: How long do I boil an egg?"));
        assert!(out.contains("'true'"));
    }

    #[test]
    fn test_recipe_parser_keeps_literal_json_braces() {
        let p = Prompts::new().unwrap();
        let out = p
            .recipe_parser(&["Crack eggs.".to_string(), "Whisk.".to_string()])
            .unwrap();
        assert!(out.contains("Crack eggs.\nWhisk."));
        assert!(out.contains(r#""servings": X"#));
        assert!(out.contains("\"difficulty\": \"easy\""));
    }

    #[test]
    fn test_final_response_lists_tools() {
        let p = Prompts::new().unwrap();
        let out = p
            .final_response("Omelette?", &recipe(), &KitchenToolSet::default(), None)
            .unwrap();
        assert!(out.contains("\"name\":\"Omelette\""));
        assert!(out.contains("every required tool: False"));
        assert!(out.contains("Missing tools: oven"));
        assert!(out.contains("Spatula, Frying Pan"));
        assert!(!out.contains("language with tag"));
    }

    #[test]
    fn test_language_hint_is_added_when_present() {
        let p = Prompts::new().unwrap();
        let out = p.general_cooking("Qu'est-ce qu'un roux ?", Some("fr")).unwrap();
        assert!(out.contains(r#"language with tag "fr""#));
    }

    #[test]
    fn test_basic_instructions_names_dish() {
        let p = Prompts::new().unwrap();
        let out = p
            .basic_instructions("rice", &KitchenToolSet::default(), None)
            .unwrap();
        assert!(out.contains("how to cook rice."));
        assert!(out.contains("Little Pot"));
    }
}
