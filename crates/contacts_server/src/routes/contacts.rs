//! JSON contacts API mounted under `/api/contacts`.
//!
//! # Invariants
//! - Path and query ids are checked for shape before the store is touched.
//! - Every failure answers with a JSON `{ "error": ... }` body.
//! - Logged events carry ids and status only, never contact field values.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contacts_core::{parse_contact_id, ContactId, ContactServiceError};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, INVALID_ID, INVALID_JSON, INVALID_QUERY, MISSING_ID};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Body of a successful create.
#[derive(Debug, Serialize)]
pub struct CreatedBody {
    pub id: ContactId,
}

fn parse_id(operation: &'static str, raw: &str) -> Result<ContactId, ApiError> {
    parse_contact_id(raw)
        .map_err(|err| ApiError::from_service(operation, ContactServiceError::from(err)))
}

/// Undecodable path segments (bad percent-encoding, invalid UTF-8) count as
/// malformed ids.
fn path_id(
    operation: &'static str,
    path: Result<Path<String>, PathRejection>,
) -> Result<ContactId, ApiError> {
    let Path(raw) = path.map_err(|_| ApiError::BadRequest(INVALID_ID.to_string()))?;
    parse_id(operation, &raw)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|_| ApiError::BadRequest(INVALID_JSON.to_string()))
}

/// `GET /api/contacts`, or a single contact when `?id=` is given.
pub async fn list_contacts(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    const OPERATION: &str = "GET /api/contacts";

    let Query(query) = query.map_err(|_| ApiError::BadRequest(INVALID_QUERY.to_string()))?;

    if let Some(raw) = query.id {
        if raw.trim().is_empty() {
            return Err(ApiError::BadRequest(MISSING_ID.to_string()));
        }
        let id = parse_id(OPERATION, raw.trim())?;
        let contact = state
            .run_service(OPERATION, move |service| service.get(id))
            .await?;
        return Ok(Json(contact).into_response());
    }

    let contacts = state
        .run_service(OPERATION, |service| service.list())
        .await?;
    Ok(Json(contacts).into_response())
}

/// `GET /api/contacts/{id}`
pub async fn get_contact(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    const OPERATION: &str = "GET /api/contacts/:id";

    let id = path_id(OPERATION, path)?;
    let contact = state
        .run_service(OPERATION, move |service| service.get(id))
        .await?;
    Ok(Json(contact).into_response())
}

/// `POST /api/contacts`; answers 201 with the new id.
pub async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    const OPERATION: &str = "POST /api/contacts";

    let payload = json_body(body)?;
    let id = state
        .run_service(OPERATION, move |service| {
            service.create_from_payload(&payload)
        })
        .await?;

    info!("event=contact_create module=api status=ok id={id}");
    Ok((StatusCode::CREATED, Json(CreatedBody { id })).into_response())
}

/// `PUT /api/contacts/{id}`; full overwrite, answers 204.
pub async fn replace_contact(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    const OPERATION: &str = "PUT /api/contacts/:id";

    let id = path_id(OPERATION, path)?;
    let payload = json_body(body)?;
    state
        .run_service(OPERATION, move |service| {
            service.replace_from_payload(id, &payload)
        })
        .await?;

    info!("event=contact_replace module=api status=ok id={id}");
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/contacts/{id}`; answers 204.
pub async fn delete_contact(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    const OPERATION: &str = "DELETE /api/contacts/:id";

    let id = path_id(OPERATION, path)?;
    state
        .run_service(OPERATION, move |service| service.delete(id))
        .await?;

    info!("event=contact_delete module=api status=ok id={id}");
    Ok(StatusCode::NO_CONTENT)
}
