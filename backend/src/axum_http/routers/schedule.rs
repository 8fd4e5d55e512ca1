use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::{
        repositories::{clubs::ClubRepository, groups::GroupRepository, unit_of_work::UnitOfWork},
        value_objects::schedules::RecurringSessionsModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{clubs::ClubPostgres, groups::GroupPostgres, unit_of_work::PgUnitOfWork},
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::{access::GroupAccess, schedule::ScheduleUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let schedule_usecase = ScheduleUseCase::new(
        GroupAccess::new(
            Arc::new(GroupPostgres::new(Arc::clone(&db_pool))),
            Arc::new(ClubPostgres::new(Arc::clone(&db_pool))),
        ),
        Arc::new(PgUnitOfWork::new(Arc::clone(&db_pool))),
        config.club.utc_offset,
    );

    Router::new()
        .route("/:group_id/sessions/recurring", post(create_recurring))
        .with_state(Arc::new(schedule_usecase))
}

pub async fn create_recurring<G, C, U>(
    State(schedule_usecase): State<Arc<ScheduleUseCase<G, C, U>>>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(recurring_sessions_model): Json<RecurringSessionsModel>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let sessions = schedule_usecase
        .create_recurring(auth.user_id, group_id, recurring_sessions_model)
        .await?;

    Ok((StatusCode::CREATED, Json(sessions)))
}
