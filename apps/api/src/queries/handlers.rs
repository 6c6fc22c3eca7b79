//! Action-routed handler for the single query endpoint.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form, Json,
};
use tracing::{debug, info};
use trail_core::params::{id_from_params, Params};
use trail_core::{Action, CreatedResponse, NewQuery, QueryEntry, QueryUpdate, UpdatedResponse};

use crate::errors::AppError;
use crate::state::AppState;

/// GET|POST /api/v1/queries
///
/// Dispatches on the `action` parameter. Form body values take precedence
/// over query-string values of the same name.
pub async fn handle_query(
    State(state): State<AppState>,
    Query(query): Query<Params>,
    form: Option<Form<Params>>,
) -> Result<Response, AppError> {
    let params = merge_params(query, form.map(|Form(body)| body));

    match Action::from_params(&params)? {
        Action::Create => create_entry(&state, &params)
            .await
            .map(IntoResponse::into_response),
        Action::Read => read_entry(&state, &params)
            .await
            .map(IntoResponse::into_response),
        Action::Update => update_entry(&state, &params)
            .await
            .map(IntoResponse::into_response),
    }
}

fn merge_params(mut query: Params, body: Option<Params>) -> Params {
    if let Some(body) = body {
        query.extend(body);
    }
    query
}

async fn create_entry(
    state: &AppState,
    params: &Params,
) -> Result<Json<CreatedResponse>, AppError> {
    let new_query = NewQuery::from_params(params)?;

    let id = state
        .store
        .create(&new_query)
        .await
        .map_err(AppError::store("Insert failed"))?;

    info!(
        "Created query {id} at {:.5}, {:.5} (tag: {})",
        new_query.coordinates.latitude, new_query.coordinates.longitude, new_query.context_tag
    );

    Ok(Json(CreatedResponse { success: true, id }))
}

async fn read_entry(state: &AppState, params: &Params) -> Result<Json<QueryEntry>, AppError> {
    let id = id_from_params(params)?;

    let entry = state
        .store
        .read(id)
        .await
        .map_err(AppError::store("Read failed"))?
        .ok_or_else(|| AppError::NotFound("Entry not found".to_string()))?;

    debug!("Read query {id}: status={}", entry.status);
    Ok(Json(entry))
}

async fn update_entry(
    state: &AppState,
    params: &Params,
) -> Result<Json<UpdatedResponse>, AppError> {
    let update = QueryUpdate::from_params(params)?;

    let matched = state
        .store
        .update(&update)
        .await
        .map_err(AppError::store("Update failed"))?;

    if matched == 0 {
        return Err(AppError::NotFound("Entry not found".to_string()));
    }

    info!("Updated query {} to status {}", update.id, update.status);
    Ok(Json(UpdatedResponse { success: true }))
}
