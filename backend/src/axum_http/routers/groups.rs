use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use crates::infra::db::postgres::postgres_connection::PgPoolSquad;

use crate::{
    axum_http::routers::{clubs, schedule, sessions, subscriptions},
    config::config_model::DotEnvyConfig,
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let clubs_usecase = clubs::club_usecase(&db_pool);
    let sessions_usecase = sessions::session_usecase(&db_pool, &config);
    let subscriptions_usecase = subscriptions::subscription_usecase(&db_pool);

    Router::new()
        .route("/", post(clubs::create_group))
        .route("/:group_id", get(clubs::find_group_by_id))
        .with_state(Arc::new(clubs_usecase))
        .merge(
            Router::new()
                .route(
                    "/:group_id/sessions",
                    post(sessions::create).get(sessions::list_by_group),
                )
                .with_state(Arc::new(sessions_usecase)),
        )
        .merge(
            Router::new()
                .route("/:group_id/subscriptions", get(subscriptions::list_by_group))
                .with_state(Arc::new(subscriptions_usecase)),
        )
        .merge(schedule::routes(db_pool, config))
}
