//! Category management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dukkan_core::{CategoryId, ValidationErrors};

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::set_flash;
use crate::models::{Category, CategoryInput};
use crate::routes::{PageContext, is_valid_slug, optional};
use crate::state::AppState;

const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub slug: String,
    pub name: String,
    pub image_url: String,
    pub position: String,
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> std::result::Result<CategoryInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let slug = self.slug.trim();
        if !is_valid_slug(slug) {
            errors.add(
                "slug",
                "Use lowercase letters, digits and hyphens, e.g. dairy-eggs",
            );
        }

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", "Name is too long");
        }

        let position = match self.position.trim() {
            "" => Some(0),
            value => errors.check("position", value.parse::<i32>(), "Position must be a number"),
        };

        errors.into_result()?;
        Ok(CategoryInput {
            slug: slug.to_string(),
            name: name.to_string(),
            image_url: optional(&self.image_url),
            position: position.unwrap_or_default(),
        })
    }
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            slug: category.slug.clone(),
            name: category.name.clone(),
            image_url: category.image_url.clone().unwrap_or_default(),
            position: category.position.to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub ctx: PageContext,
    pub categories: Vec<Category>,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub is_new: bool,
    pub form: CategoryForm,
    pub errors: ValidationErrors,
}

/// Categories in storefront order.
///
/// # Errors
///
/// Returns an error if the categories cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(CategoriesIndexTemplate {
        ctx,
        categories,
        error: None,
    })
}

#[instrument(skip(ctx))]
pub async fn new_form(ctx: PageContext) -> impl IntoResponse {
    CategoryFormTemplate {
        ctx,
        action: "/categories".to_string(),
        is_new: true,
        form: CategoryForm::default(),
        errors: ValidationErrors::new(),
    }
}

/// Save the form, re-rendering it on validation or slug conflicts.
async fn save(
    state: &AppState,
    session: &Session,
    mut page: CategoryFormTemplate,
    id: Option<CategoryId>,
) -> Result<Response> {
    let input = match page.form.validate() {
        Ok(input) => input,
        Err(errors) => {
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let categories = CategoryRepository::new(state.pool());
    let result = match id {
        Some(id) => categories.update(id, &input).await.map(|()| id),
        None => categories.create(&input).await,
    };

    match result {
        Ok(id) => {
            tracing::info!(category_id = %id, slug = %input.slug, "Category saved");
            set_flash(session, format!("Saved {}", input.name)).await?;
            Ok(Redirect::to("/categories").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            page.errors.add("slug", "This slug is already in use");
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a category.
///
/// # Errors
///
/// Returns an error if the category cannot be saved.
#[instrument(skip(state, session, ctx, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let page = CategoryFormTemplate {
        ctx,
        action: "/categories".to_string(),
        is_new: true,
        form,
        errors: ValidationErrors::new(),
    };
    save(&state, &session, page, None).await
}

/// Edit form.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(state, ctx))]
pub async fn edit_form(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = CategoryId::new(id);
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(CategoryFormTemplate {
        ctx,
        action: format!("/categories/{id}"),
        is_new: false,
        form: CategoryForm::from(&category),
        errors: ValidationErrors::new(),
    })
}

/// Save category changes.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(state, session, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let id = CategoryId::new(id);
    let page = CategoryFormTemplate {
        ctx,
        action: format!("/categories/{id}"),
        is_new: false,
        form,
        errors: ValidationErrors::new(),
    };
    save(&state, &session, page, Some(id)).await
}

/// Delete an empty category. Categories that still hold products are kept
/// and the listing is shown again with the reason.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(state, session, ctx))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    let id = CategoryId::new(id);
    let categories = CategoryRepository::new(state.pool());

    match categories.delete(id).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category deleted");
            set_flash(&session, "Category deleted").await?;
            Ok(Redirect::to("/categories").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            let page = CategoriesIndexTemplate {
                ctx,
                categories: categories.list().await?,
                error: Some(
                    "This category still has products. Move or delete them first.".to_string(),
                ),
            };
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_category_defaults_position() {
        let form = CategoryForm {
            slug: "dairy".to_string(),
            name: " Dairy & eggs ".to_string(),
            ..CategoryForm::default()
        };
        let input = form.validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(input.name, "Dairy & eggs");
        assert_eq!(input.position, 0);
        assert_eq!(input.image_url, None);
    }

    #[test]
    fn test_invalid_category_reports_each_field() {
        let form = CategoryForm {
            slug: "Dairy Eggs".to_string(),
            position: "first".to_string(),
            ..CategoryForm::default()
        };
        let errors = form.validate().err().unwrap_or_default();
        assert!(errors.has("slug"));
        assert!(errors.has("name"));
        assert!(errors.has("position"));
    }
}
