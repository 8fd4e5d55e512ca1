use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::repositories::{
        clubs::ClubRepository, groups::GroupRepository, payments::PaymentRepository,
        students::StudentRepository, subscriptions::SubscriptionRepository,
        unit_of_work::UnitOfWork,
    },
    infra::db::postgres::postgres_connection::PgPoolSquad,
};
use serde_json::json;
use tracing::warn;

use crate::{
    axum_http::{error_responses::AppError, routers::payments::payment_usecase},
    config::config_model::DotEnvyConfig,
    usecases::payments::{PaymentGateway, PaymentUseCase},
};

const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let payments_usecase = payment_usecase(&db_pool, &config);

    Router::new()
        .route("/stripe", post(stripe_webhook))
        .with_state(Arc::new(payments_usecase))
}

/// Public. The signature is checked against the raw body bytes.
pub async fn stripe_webhook<G, C, St, Sub, P, U, Gw>(
    State(payments_usecase): State<Arc<PaymentUseCase<G, C, St, Sub, P, U, Gw>>>,
    headers: HeaderMap,
    body: Bytes,
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
    let Some(signature) = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("webhooks: stripe request without signature header");
        return Err(AppError::BadRequest(
            "missing Stripe-Signature header".to_string(),
        ));
    };

    payments_usecase
        .handle_provider_event(&body, signature)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "received": true }))))
}
