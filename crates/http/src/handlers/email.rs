use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use mailtriage_core::{Email, EmptyEnvelope, Envelope, ListMeta};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::{
    BatchDeleteRequest, DeleteQuery, IngestRequest, ListQuery, MarkQuery, UpdateEmailRequest,
};
use crate::response_types::BatchDeleteResponse;

pub async fn list_emails(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Email>>>, ApiError> {
    let Query(pairs) = query?;
    let params = ListQuery::from(pairs).validate()?;
    let (emails, total) = state.email_service.list(&params).await?;
    tracing::debug!(count = emails.len(), total, offset = params.offset, "listed emails");
    Ok(Json(Envelope::success(emails, StatusCode::OK.as_u16()).with_meta(ListMeta { total })))
}

pub async fn mark_email(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MarkQuery>, QueryRejection>,
) -> Result<Json<EmptyEnvelope>, ApiError> {
    let Query(query) = query?;
    let (id, is_read) = query.validate()?;
    state.email_service.set_read_status(id, is_read).await?;
    Ok(Json(EmptyEnvelope::ok()))
}

pub async fn list_recipients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<String>>>, ApiError> {
    let recipients = state.email_service.recipients().await?;
    Ok(Json(Envelope::success(recipients, StatusCode::OK.as_u16())))
}

pub async fn delete_email(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<EmptyEnvelope>, ApiError> {
    let Query(query) = query?;
    let id = query.validate()?;
    state.email_service.delete(id).await?;
    Ok(Json(EmptyEnvelope::ok()))
}

pub async fn batch_delete_emails(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Json<Envelope<BatchDeleteResponse>>, ApiError> {
    let Json(req) = body?;
    let deleted = state.email_service.batch_delete(&req.ids).await?;
    Ok(Json(Envelope::success(BatchDeleteResponse { deleted }, StatusCode::OK.as_u16())))
}

pub async fn update_email(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateEmailRequest>, JsonRejection>,
) -> Result<Json<EmptyEnvelope>, ApiError> {
    let Json(req) = body?;
    let (id, email_result, email_type) = req.validate()?;
    state.email_service.update_result(id, email_result, email_type).await?;
    Ok(Json(EmptyEnvelope::ok()))
}

pub async fn ingest_email(
    State(state): State<Arc<AppState>>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Email>>), ApiError> {
    let Json(new_email) = body?;
    let stored = state.email_service.ingest(new_email).await?;
    Ok((StatusCode::CREATED, Json(Envelope::success(stored, StatusCode::CREATED.as_u16()))))
}
