//! Prompt building for LLM recipe generation

use crate::ingredients::IngredientList;

/// Fixed instructions sent ahead of every ingredient list.
pub const RECIPE_INSTRUCTIONS: &str = r#"You are a helpful cooking assistant that creates recipes based on ingredients provided by users.

Guidelines:
- Create practical, delicious recipes using some or all of the provided ingredients
- You can suggest additional common ingredients if needed, but try to keep it simple
- Include clear instructions and estimated cooking time
- Format your response in markdown for easy reading
- Make the recipe suitable for home cooking
- If the ingredients seem unusual together, suggest the best way to use them or recommend a fusion approach"#;

/// Build the full prompt for an ingredient list.
pub fn build_prompt(ingredients: &IngredientList) -> String {
    format!(
        r#"{instructions}

I have these ingredients: {ingredients}

Please suggest a recipe I can make with some or all of these ingredients. Include ingredients list, instructions, and estimated cooking time."#,
        instructions = RECIPE_INSTRUCTIONS,
        ingredients = ingredients.joined(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> IngredientList {
        IngredientList::new(items.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_build_prompt_contains_joined_ingredients() {
        let prompt = build_prompt(&list(&["egg", "rice", "scallion"]));
        assert!(prompt.contains("I have these ingredients: egg, rice, scallion"));
        assert!(prompt.starts_with(RECIPE_INSTRUCTIONS));
    }

    #[test]
    fn test_build_prompt_preserves_order() {
        let prompt = build_prompt(&list(&["zucchini", "apple", "miso"]));
        let z = prompt.find("zucchini").unwrap();
        let a = prompt.find("apple").unwrap();
        let m = prompt.find("miso").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn test_build_prompt_single_ingredient() {
        let prompt = build_prompt(&list(&["tofu"]));
        assert!(prompt.contains("ingredients: tofu\n"));
    }

    #[test]
    fn test_instructions_cover_requirements() {
        assert!(RECIPE_INSTRUCTIONS.contains("markdown"));
        assert!(RECIPE_INSTRUCTIONS.contains("cooking time"));
        assert!(RECIPE_INSTRUCTIONS.contains("fusion"));
        assert!(RECIPE_INSTRUCTIONS.contains("additional common ingredients"));
    }
}
