use axum::{extract::Extension, response::Json};
use serde_json::Value;

use super::auth::VerifiedIdentity;

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Decoded claims of the session token", body = serde_json::Value),
        (status = 401, description = "Session cookie missing or invalid")
    ),
    tag = "auth"
)]
// The claims were decoded once by the access verifier; nothing is re-parsed here.
pub async fn me(Extension(identity): Extension<VerifiedIdentity>) -> Json<Value> {
    Json(identity.into_claims())
}
