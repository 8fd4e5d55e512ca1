use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{clubs::ClubRepository, groups::GroupRepository, users::UserRepository},
        value_objects::clubs::{InsertClubModel, InsertGroupModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{clubs::ClubPostgres, groups::GroupPostgres, users::UserPostgres},
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{
        error_responses::AppError,
        routers::{students, subscriptions},
    },
    usecases::clubs::ClubUseCase,
};

pub type PgClubUseCase = ClubUseCase<GroupPostgres, ClubPostgres, UserPostgres>;

pub fn club_usecase(db_pool: &Arc<PgPoolSquad>) -> PgClubUseCase {
    ClubUseCase::new(
        Arc::new(GroupPostgres::new(Arc::clone(db_pool))),
        Arc::new(ClubPostgres::new(Arc::clone(db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(db_pool))),
    )
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let clubs_usecase = club_usecase(&db_pool);
    let students_usecase = students::student_usecase(&db_pool);
    let subscriptions_usecase = subscriptions::subscription_usecase(&db_pool);

    Router::new()
        .route("/", post(create_club).get(list_owned_clubs))
        .route("/:club_id", get(find_club_by_id))
        .route("/:club_id/groups", get(list_groups))
        .with_state(Arc::new(clubs_usecase))
        .merge(
            Router::new()
                .route("/:club_id/students", get(students::list_by_club))
                .with_state(Arc::new(students_usecase)),
        )
        .merge(
            Router::new()
                .route("/:club_id/subscriptions", get(subscriptions::list_by_club))
                .with_state(Arc::new(subscriptions_usecase)),
        )
}

pub async fn create_club<G, C, U>(
    State(clubs_usecase): State<Arc<ClubUseCase<G, C, U>>>,
    auth: AuthUser,
    Json(insert_club_model): Json<InsertClubModel>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let club = clubs_usecase
        .create_club(auth.user_id, insert_club_model)
        .await?;

    Ok((StatusCode::CREATED, Json(club)))
}

pub async fn list_owned_clubs<G, C, U>(
    State(clubs_usecase): State<Arc<ClubUseCase<G, C, U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let clubs = clubs_usecase.list_owned_clubs(auth.user_id).await?;

    Ok((StatusCode::OK, Json(clubs)))
}

pub async fn find_club_by_id<G, C, U>(
    State(clubs_usecase): State<Arc<ClubUseCase<G, C, U>>>,
    auth: AuthUser,
    Path(club_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let club = clubs_usecase.get_club(auth.user_id, club_id).await?;

    Ok((StatusCode::OK, Json(club)))
}

pub async fn list_groups<G, C, U>(
    State(clubs_usecase): State<Arc<ClubUseCase<G, C, U>>>,
    auth: AuthUser,
    Path(club_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let groups = clubs_usecase.list_groups(auth.user_id, club_id).await?;

    Ok((StatusCode::OK, Json(groups)))
}

pub async fn create_group<G, C, U>(
    State(clubs_usecase): State<Arc<ClubUseCase<G, C, U>>>,
    auth: AuthUser,
    Json(insert_group_model): Json<InsertGroupModel>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let group = clubs_usecase
        .create_group(auth.user_id, insert_group_model)
        .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn find_group_by_id<G, C, U>(
    State(clubs_usecase): State<Arc<ClubUseCase<G, C, U>>>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let group = clubs_usecase.get_group(auth.user_id, group_id).await?;

    Ok((StatusCode::OK, Json(group)))
}
