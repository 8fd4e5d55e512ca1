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
        repositories::{
            clubs::ClubRepository, groups::GroupRepository, payments::PaymentRepository,
            students::StudentRepository, subscriptions::SubscriptionRepository,
            unit_of_work::UnitOfWork,
        },
        value_objects::payments::{CheckoutRequestModel, ManualPaymentModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            clubs::ClubPostgres, groups::GroupPostgres, payments::PaymentPostgres,
            students::StudentPostgres, subscriptions::SubscriptionPostgres,
            unit_of_work::PgUnitOfWork,
        },
    },
    payments::stripe_client::StripeClient,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::{
        access::GroupAccess,
        payments::{PaymentGateway, PaymentSettings, PaymentUseCase},
    },
};

pub type PgPaymentUseCase = PaymentUseCase<
    GroupPostgres,
    ClubPostgres,
    StudentPostgres,
    SubscriptionPostgres,
    PaymentPostgres,
    PgUnitOfWork,
    StripeClient,
>;

pub fn payment_usecase(db_pool: &Arc<PgPoolSquad>, config: &DotEnvyConfig) -> PgPaymentUseCase {
    let stripe_client = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.webhook_tolerance_secs,
    );

    PaymentUseCase::new(
        GroupAccess::new(
            Arc::new(GroupPostgres::new(Arc::clone(db_pool))),
            Arc::new(ClubPostgres::new(Arc::clone(db_pool))),
        ),
        Arc::new(StudentPostgres::new(Arc::clone(db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(db_pool))),
        Arc::new(PaymentPostgres::new(Arc::clone(db_pool))),
        Arc::new(PgUnitOfWork::new(Arc::clone(db_pool))),
        Arc::new(stripe_client),
        PaymentSettings {
            default_currency: config.club.default_currency.clone(),
            activation_days: config.subscriptions.activation_days,
        },
    )
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let payments_usecase = payment_usecase(&db_pool, &config);

    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/manual", post(create_manual))
        .route("/:payment_id", get(find_by_id))
        .with_state(Arc::new(payments_usecase))
}

/// Public: parents pay without an account.
pub async fn create_checkout_session<G, C, St, Sub, P, U, Gw>(
    State(payments_usecase): State<Arc<PaymentUseCase<G, C, St, Sub, P, U, Gw>>>,
    Json(checkout_request_model): Json<CheckoutRequestModel>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    St: StudentRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    let checkout = payments_usecase
        .create_checkout(checkout_request_model)
        .await?;

    Ok((StatusCode::OK, Json(checkout)))
}

pub async fn create_manual<G, C, St, Sub, P, U, Gw>(
    State(payments_usecase): State<Arc<PaymentUseCase<G, C, St, Sub, P, U, Gw>>>,
    auth: AuthUser,
    Json(manual_payment_model): Json<ManualPaymentModel>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    St: StudentRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    let payment = payments_usecase
        .create_manual(auth.user_id, manual_payment_model)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn list_by_subscription<G, C, St, Sub, P, U, Gw>(
    State(payments_usecase): State<Arc<PaymentUseCase<G, C, St, Sub, P, U, Gw>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    St: StudentRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    let payments = payments_usecase
        .list_by_subscription(auth.user_id, subscription_id)
        .await?;

    Ok((StatusCode::OK, Json(payments)))
}

pub async fn find_by_id<G, C, St, Sub, P, U, Gw>(
    State(payments_usecase): State<Arc<PaymentUseCase<G, C, St, Sub, P, U, Gw>>>,
    auth: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    St: StudentRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    let payment = payments_usecase.get(auth.user_id, payment_id).await?;

    Ok((StatusCode::OK, Json(payment)))
}
