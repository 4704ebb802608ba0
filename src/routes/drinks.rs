//! Drink endpoints
//!
//! Handlers run after the dispatcher has enforced the route's capability.
//! Every success body carries `success: true`; failures are returned as
//! [`CoffeeShopError`] and rendered by the dispatcher.

use futures_util::FutureExt;
use hyper::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{json_response, HandlerFuture, RequestContext};
use crate::model::{Drink, ModelError, NewDrink, RecipeInput};
use crate::server::AppState;
use crate::types::{CoffeeShopError, Result};

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: RecipeInput,
}

/// Partial update; at least one field must be present
#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

#[derive(Serialize)]
struct DrinksResponse<T> {
    success: bool,
    drinks: Vec<T>,
}

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
    delete: i64,
}

fn drinks_response<T: Serialize>(drinks: Vec<T>) -> hyper::Response<super::FullBody> {
    json_response(
        StatusCode::OK,
        &DrinksResponse {
            success: true,
            drinks,
        },
    )
}

fn parse_body<T: DeserializeOwned>(ctx: &RequestContext) -> Result<T> {
    if ctx.body.is_empty() {
        return Err(CoffeeShopError::BadRequest("request body is empty".into()));
    }
    Ok(serde_json::from_slice(&ctx.body)?)
}

fn drink_id(ctx: &RequestContext) -> Result<i64> {
    ctx.params.get_i64("id").ok_or(CoffeeShopError::NotFound)
}

async fn find_drink(state: &AppState, id: i64) -> Result<Drink> {
    state
        .store
        .get(id)
        .await?
        .ok_or(CoffeeShopError::NotFound)
}

/// Records are validated on write; a projection failure means the stored
/// recipe was changed outside this service
fn unreadable(id: i64, err: ModelError) -> CoffeeShopError {
    CoffeeShopError::Internal(format!("drink {id} has an unreadable recipe: {err}"))
}

/// GET /drinks
pub fn list_drinks(state: Arc<AppState>, _ctx: RequestContext) -> HandlerFuture {
    async move {
        let drinks = state.store.list().await?;
        let short = drinks
            .iter()
            .map(|d| d.short().map_err(|e| unreadable(d.id, e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(drinks_response(short))
    }
    .boxed()
}

/// GET /drinks-detail
pub fn list_drinks_detail(state: Arc<AppState>, _ctx: RequestContext) -> HandlerFuture {
    async move {
        let drinks = state.store.list().await?;
        let long = drinks
            .iter()
            .map(|d| d.long().map_err(|e| unreadable(d.id, e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(drinks_response(long))
    }
    .boxed()
}

/// POST /drinks
pub fn create_drink(state: Arc<AppState>, ctx: RequestContext) -> HandlerFuture {
    async move {
        let request: CreateDrinkRequest = parse_body(&ctx)?;
        let new_drink = NewDrink::new(&request.title, request.recipe)?;
        let drink = state.store.insert(new_drink).await?;

        info!(id = drink.id, title = %drink.title, sub = ctx.subject(), "Drink created");
        let long = drink.long().map_err(|e| unreadable(drink.id, e))?;
        Ok(drinks_response(vec![long]))
    }
    .boxed()
}

/// PATCH /drinks/{id}
pub fn update_drink(state: Arc<AppState>, ctx: RequestContext) -> HandlerFuture {
    async move {
        let id = drink_id(&ctx)?;
        let mut drink = find_drink(&state, id).await?;

        let request: UpdateDrinkRequest = parse_body(&ctx)?;
        if request.title.is_none() && request.recipe.is_none() {
            return Err(CoffeeShopError::BadRequest(
                "nothing to update: expected title or recipe".into(),
            ));
        }

        drink.apply(request.title.as_deref(), request.recipe)?;
        state.store.update(&drink).await?;

        info!(id, title = %drink.title, sub = ctx.subject(), "Drink updated");
        let long = drink.long().map_err(|e| unreadable(drink.id, e))?;
        Ok(drinks_response(vec![long]))
    }
    .boxed()
}

/// DELETE /drinks/{id}
pub fn delete_drink(state: Arc<AppState>, ctx: RequestContext) -> HandlerFuture {
    async move {
        let id = drink_id(&ctx)?;
        let drink = find_drink(&state, id).await?;
        state.store.delete(&drink).await?;

        info!(id, sub = ctx.subject(), "Drink deleted");
        Ok(json_response(
            StatusCode::OK,
            &DeleteResponse {
                success: true,
                delete: id,
            },
        ))
    }
    .boxed()
}
