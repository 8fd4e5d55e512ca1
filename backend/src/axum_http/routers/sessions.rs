use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use crates::{
    domain::{
        repositories::{
            attendances::AttendanceRepository, clubs::ClubRepository, groups::GroupRepository,
            sessions::SessionRepository, unit_of_work::UnitOfWork,
        },
        value_objects::schedules::{InsertSessionModel, SessionRangeQuery, UpdateSessionModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            attendances::AttendancePostgres, clubs::ClubPostgres, groups::GroupPostgres,
            sessions::SessionPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, routers::attendance::attendance_usecase},
    config::config_model::DotEnvyConfig,
    usecases::{access::GroupAccess, attendance::AttendanceUseCase, sessions::SessionUseCase},
};

pub type PgSessionUseCase =
    SessionUseCase<SessionPostgres, GroupPostgres, ClubPostgres, AttendancePostgres>;

pub fn session_usecase(db_pool: &Arc<PgPoolSquad>, config: &DotEnvyConfig) -> PgSessionUseCase {
    SessionUseCase::new(
        GroupAccess::new(
            Arc::new(GroupPostgres::new(Arc::clone(db_pool))),
            Arc::new(ClubPostgres::new(Arc::clone(db_pool))),
        ),
        Arc::new(SessionPostgres::new(Arc::clone(db_pool))),
        Arc::new(AttendancePostgres::new(Arc::clone(db_pool))),
        config.club.utc_offset,
    )
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let sessions_usecase = session_usecase(&db_pool, &config);
    let attendance_usecase = attendance_usecase(&db_pool, &config);

    Router::new()
        .route(
            "/:session_id",
            get(find_by_id).put(update).delete(delete),
        )
        .with_state(Arc::new(sessions_usecase))
        .merge(
            Router::new()
                .route("/:session_id/attendance", get(list_attendance))
                .with_state(Arc::new(attendance_usecase)),
        )
}

/// Mounted under `/groups/:group_id/sessions`.
pub async fn create<Ses, G, C, A>(
    State(sessions_usecase): State<Arc<SessionUseCase<Ses, G, C, A>>>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(insert_session_model): Json<InsertSessionModel>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let session = sessions_usecase
        .create(auth.user_id, group_id, insert_session_model)
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Mounted under `/groups/:group_id/sessions`.
pub async fn list_by_group<Ses, G, C, A>(
    State(sessions_usecase): State<Arc<SessionUseCase<Ses, G, C, A>>>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(range): Query<SessionRangeQuery>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let sessions = sessions_usecase
        .list_by_group(auth.user_id, group_id, range, Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(sessions)))
}

pub async fn find_by_id<Ses, G, C, A>(
    State(sessions_usecase): State<Arc<SessionUseCase<Ses, G, C, A>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let session = sessions_usecase.get(auth.user_id, session_id).await?;

    Ok((StatusCode::OK, Json(session)))
}

pub async fn update<Ses, G, C, A>(
    State(sessions_usecase): State<Arc<SessionUseCase<Ses, G, C, A>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(update_session_model): Json<UpdateSessionModel>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let session = sessions_usecase
        .update(auth.user_id, session_id, update_session_model)
        .await?;

    Ok((StatusCode::OK, Json(session)))
}

pub async fn delete<Ses, G, C, A>(
    State(sessions_usecase): State<Arc<SessionUseCase<Ses, G, C, A>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    sessions_usecase.delete(auth.user_id, session_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_attendance<Ses, G, C, A, U>(
    State(attendance_usecase): State<Arc<AttendanceUseCase<Ses, G, C, A, U>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let attendances = attendance_usecase
        .list_by_session(auth.user_id, session_id)
        .await?;

    Ok((StatusCode::OK, Json(attendances)))
}
