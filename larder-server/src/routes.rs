//! Request handlers: recipe generation, PDF export, and both in one call.
//!
//! Every handler validates its input before touching the model or the
//! renderer, so a rejected request never reaches either.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use chrono::{Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use larder_ai::IngredientList;
use larder_document::{to_plain_text, RecipeDocument};

use crate::error::{
    ApiError, INGREDIENTS_REQUIRED, RECIPE_FAILED, RECIPE_PDF_FAILED, RENDER_FIELDS_REQUIRED,
};
use crate::stream::pdf_response;
use crate::AppState;

pub const RECIPE_FILENAME: &str = "recipe.pdf";
pub const GENERATED_RECIPE_FILENAME: &str = "gemini-recipe.pdf";

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    ingredients: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    ingredients: Option<Vec<String>>,
    recipe: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub success: bool,
    pub ingredients: Vec<String>,
    pub recipe: String,
    pub model: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub model: String,
}

/// GET / — liveness and the model in use.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Recipe API is running!".to_string(),
        model: state.generator.model().to_string(),
    })
}

/// POST /api/recipe — markdown recipe for a list of ingredients.
pub async fn generate_recipe(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let ingredients = ingredients_from(payload)?;
    info!("Generating recipe for {} ingredients", ingredients.len());

    let recipe = state
        .generator
        .generate_recipe(&ingredients)
        .await
        .map_err(|e| ApiError::generation(e, RECIPE_FAILED))?;

    Ok(Json(RecipeResponse {
        success: true,
        ingredients: ingredients.into_inner(),
        recipe,
        model: state.generator.model().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// POST /api/recipe/pdf — render a recipe the client already has.
pub async fn render_recipe_pdf(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Unreadable render request: {}", rejection);
        ApiError::Validation(RENDER_FIELDS_REQUIRED)
    })?;
    let (Some(ingredients), Some(recipe)) = (
        request.ingredients,
        request.recipe.filter(|r| !r.is_empty()),
    ) else {
        return Err(ApiError::Validation(RENDER_FIELDS_REQUIRED));
    };

    info!("Rendering supplied recipe ({} bytes)", recipe.len());
    let document = RecipeDocument::new(
        &ingredients,
        &to_plain_text(&recipe),
        state.generator.provider_label(),
        &Local::now(),
    );
    pdf_response(document, RECIPE_FILENAME).await
}

/// POST /api/recipe-pdf — generate a recipe and return it as a PDF.
pub async fn generate_recipe_pdf(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let ingredients = ingredients_from(payload)?;
    info!("Generating recipe PDF for {} ingredients", ingredients.len());

    let recipe = state
        .generator
        .generate_recipe(&ingredients)
        .await
        .map_err(|e| ApiError::generation(e, RECIPE_PDF_FAILED))?;

    let document = RecipeDocument::new(
        ingredients.as_slice(),
        &to_plain_text(&recipe),
        state.generator.provider_label(),
        &Local::now(),
    );
    pdf_response(document, GENERATED_RECIPE_FILENAME).await
}

fn ingredients_from(
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<IngredientList, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Unreadable recipe request: {}", rejection);
        ApiError::Validation(INGREDIENTS_REQUIRED)
    })?;

    let items = request
        .ingredients
        .ok_or(ApiError::Validation(INGREDIENTS_REQUIRED))?;
    IngredientList::new(items).map_err(|e| {
        debug!("Invalid ingredient list: {}", e);
        ApiError::Validation(INGREDIENTS_REQUIRED)
    })
}
