use crate::dto::{
    ApiJson, ApiPath, ApiQuery, DateRangeParams, HealthResponse, PageParams, UserResponse,
};
use crate::error::ApiError;
use application::UserApp;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use domain::{DateRange, Page, UserPatch, UserRequest};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub user_app: Arc<UserApp>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // User management endpoints
        .route("/users", get(list_users).post(create_user))
        .route("/users/range", get(list_users_in_range))
        .route(
            "/users/:id",
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
        // Health check
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Handler functions
async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    let page = state.user_app.user_service.list_users(params.into()).await?;
    Ok(Json(page.map(UserResponse::from)))
}

async fn list_users_in_range(
    State(state): State<AppState>,
    dates: Result<Query<DateRangeParams>, QueryRejection>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    let Query(dates) = dates.map_err(|_| ApiError::MalformedDate)?;
    let range = DateRange::new(dates.from, dates.to)?;

    let page = state
        .user_app
        .user_service
        .list_users_in_range(range, params.into())
        .await?;
    Ok(Json(page.map(UserResponse::from)))
}

async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_app.user_service.get_user(id).await?;
    Ok(Json(user.into()))
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_app.user_service.create_user(request).await?;
    info!("✅ Registered user {}", user.id);

    let location = format!("/users/{}", user.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]))
}

async fn replace_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<StatusCode, ApiError> {
    state.user_app.user_service.replace_user(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn patch_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<StatusCode, ApiError> {
    state.user_app.user_service.patch_user(id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    state.user_app.user_service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
