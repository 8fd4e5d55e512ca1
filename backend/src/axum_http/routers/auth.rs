use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::repositories::users::UserRepository,
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
};

use crate::{
    auth::{AuthUser, TokenManager},
    axum_http::error_responses::AppError,
    usecases::auth::{AuthUseCase, LoginModel, RefreshModel, SignupModel},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, tokens: Arc<TokenManager>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let auth_usecase = AuthUseCase::new(Arc::new(user_repository), tokens);

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .with_state(Arc::new(auth_usecase))
}

pub async fn signup<U>(
    State(auth_usecase): State<Arc<AuthUseCase<U>>>,
    Json(signup_model): Json<SignupModel>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let signed_up = auth_usecase.signup(signup_model).await?;

    Ok((StatusCode::CREATED, Json(signed_up)))
}

pub async fn login<U>(
    State(auth_usecase): State<Arc<AuthUseCase<U>>>,
    Json(login_model): Json<LoginModel>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let tokens = auth_usecase.login(login_model).await?;

    Ok((StatusCode::OK, Json(tokens)))
}

pub async fn refresh<U>(
    State(auth_usecase): State<Arc<AuthUseCase<U>>>,
    Json(refresh_model): Json<RefreshModel>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let tokens = auth_usecase.refresh(refresh_model).await?;

    Ok((StatusCode::OK, Json(tokens)))
}

pub async fn me<U>(
    State(auth_usecase): State<Arc<AuthUseCase<U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let user = auth_usecase.me(auth.user_id).await?;

    Ok((StatusCode::OK, Json(user)))
}
