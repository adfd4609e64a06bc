use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{User, UserRole};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub business_name: Option<String>,
}

// POST /api/users
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if body.uid.trim().is_empty() || body.email.trim().is_empty() {
        return Err(AppError::BadRequest("uid and email are required".to_string()));
    }

    let email = body.email.trim().to_lowercase();
    let user = User {
        id: body.uid,
        name: body.name,
        email,
        role: body.role,
        phone: body.phone,
        business_name: body.business_name,
        email_verified: false,
        is_active: true,
        created_at: chrono::Utc::now().naive_utc(),
    };

    let conn = state.db.lock().unwrap();
    if queries::find_user_by_id_or_email(&conn, &user.id, &user.email)?.is_some() {
        return Err(AppError::Duplicate("user".to_string()));
    }
    queries::create_user(&conn, &user)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "user created", "id": user.id })),
    ))
}
