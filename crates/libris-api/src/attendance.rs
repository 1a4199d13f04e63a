//! Handlers for `/attendance` routes.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use chrono::{Local, NaiveDate};
use libris_core::{
  event::AttendanceEvent,
  mail::MailTransport,
  status::AttendanceView,
  store::{EventStore, PersonRegistry},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiContext, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ScanBody {
  pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
  /// Local calendar date; today when absent.
  pub date: Option<NaiveDate>,
}

impl DateQuery {
  fn date_or_today(&self) -> NaiveDate {
    self.date.unwrap_or_else(|| Local::now().date_naive())
  }
}

/// `POST /attendance/scan`
pub async fn scan<S, M>(
  State(ctx): State<Arc<ApiContext<S, M>>>,
  Json(body): Json<ScanBody>,
) -> Result<(StatusCode, Json<AttendanceEvent>), ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  let event = ctx.recorder.record_scan(&body.code).await?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /attendance?date=YYYY-MM-DD`
pub async fn log<S, M>(
  State(ctx): State<Arc<ApiContext<S, M>>>,
  Query(q): Query<DateQuery>,
) -> Result<Json<Vec<AttendanceEvent>>, ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  Ok(Json(ctx.recorder.daily_log(q.date_or_today()).await?))
}

/// `GET /attendance/status/{code}?date=YYYY-MM-DD`
pub async fn status<S, M>(
  State(ctx): State<Arc<ApiContext<S, M>>>,
  Path(code): Path<String>,
  Query(q): Query<DateQuery>,
) -> Result<Json<AttendanceView>, ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  Ok(Json(ctx.recorder.day_view(&code, q.date_or_today()).await?))
}

/// `DELETE /attendance/{id}`
pub async fn delete_one<S, M>(
  State(ctx): State<Arc<ApiContext<S, M>>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  ctx.recorder.delete_event(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
