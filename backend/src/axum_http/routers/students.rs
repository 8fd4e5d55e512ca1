use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            attendances::AttendanceRepository, clubs::ClubRepository, groups::GroupRepository,
            students::StudentRepository,
        },
        value_objects::students::{InsertStudentModel, PageQuery},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            attendances::AttendancePostgres, clubs::ClubPostgres, groups::GroupPostgres,
            students::StudentPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, routers::subscriptions},
    usecases::{access::GroupAccess, students::StudentUseCase},
};

pub type PgStudentUseCase =
    StudentUseCase<StudentPostgres, GroupPostgres, ClubPostgres, AttendancePostgres>;

pub fn student_usecase(db_pool: &Arc<PgPoolSquad>) -> PgStudentUseCase {
    StudentUseCase::new(
        GroupAccess::new(
            Arc::new(GroupPostgres::new(Arc::clone(db_pool))),
            Arc::new(ClubPostgres::new(Arc::clone(db_pool))),
        ),
        Arc::new(StudentPostgres::new(Arc::clone(db_pool))),
        Arc::new(AttendancePostgres::new(Arc::clone(db_pool))),
    )
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let students_usecase = student_usecase(&db_pool);
    let subscriptions_usecase = subscriptions::subscription_usecase(&db_pool);

    Router::new()
        .route("/", post(create))
        .route("/:student_id", get(find_by_id))
        .route("/:student_id/attendance", get(attendance_history))
        .with_state(Arc::new(students_usecase))
        .merge(
            Router::new()
                .route("/:student_id/subscriptions", get(subscriptions::list_by_student))
                .with_state(Arc::new(subscriptions_usecase)),
        )
}

pub async fn create<St, G, C, A>(
    State(students_usecase): State<Arc<StudentUseCase<St, G, C, A>>>,
    auth: AuthUser,
    Json(insert_student_model): Json<InsertStudentModel>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let student = students_usecase
        .create(auth.user_id, insert_student_model)
        .await?;

    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn find_by_id<St, G, C, A>(
    State(students_usecase): State<Arc<StudentUseCase<St, G, C, A>>>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let student = students_usecase.get(auth.user_id, student_id).await?;

    Ok((StatusCode::OK, Json(student)))
}

pub async fn list_by_club<St, G, C, A>(
    State(students_usecase): State<Arc<StudentUseCase<St, G, C, A>>>,
    auth: AuthUser,
    Path(club_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let students = students_usecase
        .list_by_club(auth.user_id, club_id, page)
        .await?;

    Ok((StatusCode::OK, Json(students)))
}

pub async fn attendance_history<St, G, C, A>(
    State(students_usecase): State<Arc<StudentUseCase<St, G, C, A>>>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    let attendances = students_usecase
        .attendance_history(auth.user_id, student_id)
        .await?;

    Ok((StatusCode::OK, Json(attendances)))
}
