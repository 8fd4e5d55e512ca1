use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use crates::{
    domain::{
        repositories::{
            clubs::ClubRepository, groups::GroupRepository, students::StudentRepository,
            subscriptions::SubscriptionRepository, unit_of_work::UnitOfWork,
        },
        value_objects::subscriptions::{InsertSubscriptionModel, SubscriptionListQuery},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            clubs::ClubPostgres, groups::GroupPostgres, students::StudentPostgres,
            subscriptions::SubscriptionPostgres, unit_of_work::PgUnitOfWork,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, routers::payments},
    config::config_model::DotEnvyConfig,
    usecases::{access::GroupAccess, subscriptions::SubscriptionUseCase},
};

pub type PgSubscriptionUseCase = SubscriptionUseCase<
    StudentPostgres,
    GroupPostgres,
    ClubPostgres,
    SubscriptionPostgres,
    PgUnitOfWork,
>;

pub fn subscription_usecase(db_pool: &Arc<PgPoolSquad>) -> PgSubscriptionUseCase {
    SubscriptionUseCase::new(
        GroupAccess::new(
            Arc::new(GroupPostgres::new(Arc::clone(db_pool))),
            Arc::new(ClubPostgres::new(Arc::clone(db_pool))),
        ),
        Arc::new(StudentPostgres::new(Arc::clone(db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(db_pool))),
        Arc::new(PgUnitOfWork::new(Arc::clone(db_pool))),
    )
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let subscriptions_usecase = subscription_usecase(&db_pool);
    let payments_usecase = payments::payment_usecase(&db_pool, &config);

    Router::new()
        .route("/", post(create))
        .route("/:id", get(find_by_id))
        .route("/:id/cancel", put(cancel))
        .with_state(Arc::new(subscriptions_usecase))
        .merge(
            Router::new()
                .route("/:id/payments", get(payments::list_by_subscription))
                .with_state(Arc::new(payments_usecase)),
        )
}

pub async fn create<St, G, C, Sub, U>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<St, G, C, Sub, U>>>,
    auth: AuthUser,
    Json(insert_subscription_model): Json<InsertSubscriptionModel>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let subscription = subscriptions_usecase
        .create(auth.user_id, insert_subscription_model)
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn find_by_id<St, G, C, Sub, U>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<St, G, C, Sub, U>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let subscription = subscriptions_usecase
        .get(auth.user_id, subscription_id)
        .await?;

    Ok((StatusCode::OK, Json(subscription)))
}

pub async fn cancel<St, G, C, Sub, U>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<St, G, C, Sub, U>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let subscription = subscriptions_usecase
        .cancel(auth.user_id, subscription_id)
        .await?;

    Ok((StatusCode::OK, Json(subscription)))
}

/// Mounted under `/students/:student_id/subscriptions`.
pub async fn list_by_student<St, G, C, Sub, U>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<St, G, C, Sub, U>>>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let subscriptions = subscriptions_usecase
        .list_by_student(auth.user_id, student_id)
        .await?;

    Ok((StatusCode::OK, Json(subscriptions)))
}

/// Mounted under `/groups/:group_id/subscriptions`.
pub async fn list_by_group<St, G, C, Sub, U>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<St, G, C, Sub, U>>>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let subscriptions = subscriptions_usecase
        .list_by_group(auth.user_id, group_id, query)
        .await?;

    Ok((StatusCode::OK, Json(subscriptions)))
}

/// Mounted under `/clubs/:club_id/subscriptions`.
pub async fn list_by_club<St, G, C, Sub, U>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<St, G, C, Sub, U>>>,
    auth: AuthUser,
    Path(club_id): Path<Uuid>,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<impl IntoResponse, AppError>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    let subscriptions = subscriptions_usecase
        .list_by_club(auth.user_id, club_id, query)
        .await?;

    Ok((StatusCode::OK, Json(subscriptions)))
}
