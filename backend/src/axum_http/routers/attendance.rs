use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use crates::{
    domain::{
        repositories::{
            attendances::AttendanceRepository, clubs::ClubRepository, groups::GroupRepository,
            sessions::SessionRepository, unit_of_work::UnitOfWork,
        },
        value_objects::attendances::{
            BulkAttendanceModel, MarkAttendanceModel, UpdateAttendanceModel,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            attendances::AttendancePostgres, clubs::ClubPostgres, groups::GroupPostgres,
            sessions::SessionPostgres, unit_of_work::PgUnitOfWork,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::{access::GroupAccess, attendance::AttendanceUseCase},
};

pub type PgAttendanceUseCase =
    AttendanceUseCase<SessionPostgres, GroupPostgres, ClubPostgres, AttendancePostgres, PgUnitOfWork>;

pub fn attendance_usecase(db_pool: &Arc<PgPoolSquad>, config: &DotEnvyConfig) -> PgAttendanceUseCase {
    AttendanceUseCase::new(
        Arc::new(SessionPostgres::new(Arc::clone(db_pool))),
        GroupAccess::new(
            Arc::new(GroupPostgres::new(Arc::clone(db_pool))),
            Arc::new(ClubPostgres::new(Arc::clone(db_pool))),
        ),
        Arc::new(AttendancePostgres::new(Arc::clone(db_pool))),
        Arc::new(PgUnitOfWork::new(Arc::clone(db_pool))),
        config.attendance.restore_credit_on_delete,
    )
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let attendance_usecase = attendance_usecase(&db_pool, &config);

    Router::new()
        .route("/", post(mark))
        .route("/bulk", post(mark_bulk))
        .route("/:id", put(update).delete(delete))
        .with_state(Arc::new(attendance_usecase))
}

pub async fn mark<Ses, G, C, A, U>(
    State(attendance_usecase): State<Arc<AttendanceUseCase<Ses, G, C, A, U>>>,
    auth: AuthUser,
    Json(mark_attendance_model): Json<MarkAttendanceModel>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let attendance = attendance_usecase
        .mark(auth.user_id, mark_attendance_model)
        .await?;

    Ok((StatusCode::CREATED, Json(attendance)))
}

pub async fn mark_bulk<Ses, G, C, A, U>(
    State(attendance_usecase): State<Arc<AttendanceUseCase<Ses, G, C, A, U>>>,
    auth: AuthUser,
    Json(bulk_attendance_model): Json<BulkAttendanceModel>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let results = attendance_usecase
        .mark_bulk(auth.user_id, bulk_attendance_model)
        .await?;

    Ok((StatusCode::OK, Json(results)))
}

pub async fn update<Ses, G, C, A, U>(
    State(attendance_usecase): State<Arc<AttendanceUseCase<Ses, G, C, A, U>>>,
    auth: AuthUser,
    Path(attendance_id): Path<Uuid>,
    Json(update_attendance_model): Json<UpdateAttendanceModel>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let attendance = attendance_usecase
        .update(auth.user_id, attendance_id, update_attendance_model.status)
        .await?;

    Ok((StatusCode::OK, Json(attendance)))
}

pub async fn delete<Ses, G, C, A, U>(
    State(attendance_usecase): State<Arc<AttendanceUseCase<Ses, G, C, A, U>>>,
    auth: AuthUser,
    Path(attendance_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    attendance_usecase.delete(auth.user_id, attendance_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
