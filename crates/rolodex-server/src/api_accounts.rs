//! REST handlers for the account resource.
//!
//! Database work happens on the blocking pool (`spawn_blocking`) with a
//! connection checked out per request. Validation failures map to `400`
//! with the validation message in the body; storage failures are logged and
//! map to `500` except for `NotFound`, which maps to `404`.

use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::Json,
};
use rolodex_accounts::{Account, AccountError, ValidationError};
use rolodex_db::Record;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Error responses carry a machine-readable status and a human-readable body.
type ApiError = (StatusCode, Json<Value>);

fn error_body(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "error": message.into() }))
}

fn internal_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_body("internal server error"),
    )
}

fn validation_error_response(e: ValidationError) -> ApiError {
    (StatusCode::BAD_REQUEST, error_body(e.to_string()))
}

/// Maps an [`AccountError`] to the right HTTP response, logging non-404
/// failures.
fn account_error_response(e: AccountError) -> ApiError {
    match e {
        AccountError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            error_body(format!("account not found: {id}")),
        ),
        err => {
            tracing::error!(error = %err, "account operation failed");
            internal_error()
        }
    }
}

/// Query parameters accepted by the list endpoint.
#[derive(Deserialize)]
pub struct ListParams {
    /// Exact-match name filter.
    pub name: Option<String>,
}

/// POST /accounts
pub async fn create_account_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Value>), ApiError> {
    let account = Account::deserialize(&payload).map_err(validation_error_response)?;

    let account = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for create_account");
            internal_error()
        })?;
        let mut account = account;
        account.create(&conn).map_err(account_error_response)?;
        Ok::<_, ApiError>(account)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "create_account task join error");
        internal_error()
    })??;

    let id = account.id.ok_or_else(|| {
        tracing::error!("create returned without an assigned id");
        internal_error()
    })?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/accounts/{id}"))],
        Json(account.serialize()),
    ))
}

/// GET /accounts
///
/// Lists every account, or only those whose name exactly matches the
/// optional `?name=` query parameter.
pub async fn list_accounts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let accounts = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for list_accounts");
            internal_error()
        })?;
        match params.name {
            Some(ref name) => Account::find_by_name(&conn, name),
            None => Account::all(&conn),
        }
        .map_err(account_error_response)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "list_accounts task join error");
        internal_error()
    })??;

    Ok(Json(accounts.iter().map(Account::serialize).collect()))
}

/// GET /accounts/{id}
pub async fn get_account_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let account = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for get_account");
            internal_error()
        })?;
        Account::find(&conn, id).map_err(account_error_response)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "get_account task join error");
        internal_error()
    })??;

    match account {
        Some(account) => Ok(Json(account.serialize())),
        None => Err((
            StatusCode::NOT_FOUND,
            error_body(format!("account not found: {id}")),
        )),
    }
}

/// PUT /accounts/{id}
///
/// Full replace: the body is validated like a create payload, then written
/// over the stored row. `404` if the id has never been created or was
/// deleted.
pub async fn update_account_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut account = Account::deserialize(&payload).map_err(validation_error_response)?;
    account.id = Some(id);

    let account = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for update_account");
            internal_error()
        })?;
        account.update(&conn).map_err(account_error_response)?;
        Ok::<_, ApiError>(account)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "update_account task join error");
        internal_error()
    })??;

    Ok(Json(account.serialize()))
}

/// DELETE /accounts/{id}
///
/// Always `204`: deleting an id that does not exist (or was already
/// deleted) is a no-op, keeping the route idempotent.
pub async fn delete_account_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for delete_account");
            internal_error()
        })?;
        match Account::find(&conn, id).map_err(account_error_response)? {
            Some(account) => match account.delete(&conn) {
                // A concurrent delete winning the race is still a success.
                Ok(()) | Err(AccountError::NotFound(_)) => Ok(()),
                Err(e) => Err(account_error_response(e)),
            },
            None => Ok(()),
        }
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "delete_account task join error");
        internal_error()
    })??;

    Ok(StatusCode::NO_CONTENT)
}
