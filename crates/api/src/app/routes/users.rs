use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use storefront_auth::{Policy, hash_password, verify_password};
use storefront_catalog::{LoginUser, NewUser, RegisterUser, UpdateUser, User, UserUpdate};
use storefront_core::UserId;
use storefront_infra::StoreError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::CurrentIdentity;

const ALREADY_REGISTERED: &str = "This user is already registered.";
const EMAIL_IN_USE: &str = "This email is already in use.";
const INVALID_LOGIN: &str = "Invalid email or password";

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route(
            "/profile/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store.find_credentials_by_email(&body.email).await {
        Ok(Some(_)) => return errors::json_error(StatusCode::BAD_REQUEST, "conflict", ALREADY_REGISTERED),
        Ok(None) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    let password_hash = match hash_blocking(body.password).await {
        Ok(h) => h,
        Err(res) => return res,
    };

    let user = match services
        .store
        .create_user(NewUser {
            username: body.username,
            email: body.email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        Err(StoreError::Conflict(_)) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "conflict", ALREADY_REGISTERED);
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(user_id = %user.id, "user registered");

    let (_, cookie) = match session_cookie(&services, &user) {
        Ok(pair) => pair,
        Err(res) => return res,
    };

    (
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(user),
    )
        .into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginUser>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    let credentials = match services.store.find_credentials_by_email(&body.email).await {
        Ok(Some(c)) => c,
        Ok(None) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_credentials", INVALID_LOGIN),
        Err(e) => return errors::store_error_to_response(e),
    };

    let hash = credentials.password_hash;
    let password = body.password;
    let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await;
    match verified {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => {
            tracing::info!(user_id = %credentials.user.id, "login rejected");
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_credentials", INVALID_LOGIN);
        }
        Ok(Err(e)) => {
            tracing::error!(user_id = %credentials.user.id, error = %e, "stored password hash unusable");
            return errors::internal_error();
        }
        Err(e) => {
            tracing::error!(error = %e, "password verification task failed");
            return errors::internal_error();
        }
    }

    let user = credentials.user;
    let (token, cookie) = match session_cookie(&services, &user) {
        Ok(pair) => pair,
        Err(res) => return res,
    };

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "user logged in");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(dto::LoginResponse {
            message: "Authenticated",
            token,
        }),
    )
        .into_response()
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, services.carrier.clear())],
        Json(dto::MessageResponse {
            message: "Logged out",
        }),
    )
        .into_response()
}

pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user = match load_user(&services, &id).await {
        Ok(u) => u,
        Err(res) => return res,
    };
    if let Err(res) = authz::enforce(Policy::OwnerOrAdmin, &current, Some(user.id)) {
        return res;
    }

    (StatusCode::OK, Json(user)).into_response()
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> axum::response::Response {
    let user = match load_user(&services, &id).await {
        Ok(u) => u,
        Err(res) => return res,
    };
    if let Err(res) = authz::enforce(Policy::OwnerOnly, &current, Some(user.id)) {
        return res;
    }

    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    let password_hash = match body.password {
        Some(password) => match hash_blocking(password).await {
            Ok(h) => Some(h),
            Err(res) => return res,
        },
        None => None,
    };

    let update = UserUpdate {
        username: body.username,
        email: body.email,
        password_hash,
    };

    match services.store.update_user(user.id, update).await {
        Ok(Some(updated)) => (StatusCode::OK, Json(updated)).into_response(),
        Ok(None) => errors::not_found("user"),
        Err(StoreError::Conflict(_)) => errors::json_error(StatusCode::BAD_REQUEST, "conflict", EMAIL_IN_USE),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user = match load_user(&services, &id).await {
        Ok(u) => u,
        Err(res) => return res,
    };
    if let Err(res) = authz::enforce(Policy::OwnerOnly, &current, Some(user.id)) {
        return res;
    }

    match services.store.delete_user(user.id).await {
        Ok(true) => {
            tracing::info!(user_id = %user.id, "user deleted");
            (
                StatusCode::OK,
                [(header::SET_COOKIE, services.carrier.clear())],
                Json(dto::MessageResponse {
                    message: "User deleted",
                }),
            )
                .into_response()
        }
        Ok(false) => errors::not_found("user"),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn load_user(services: &AppServices, raw_id: &str) -> Result<User, axum::response::Response> {
    let id: UserId = dto::parse_id(raw_id)?;
    match services.store.get_user(id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(errors::not_found("user")),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}

/// Fresh session token for `user` and the `Set-Cookie` value carrying it.
fn session_cookie(
    services: &AppServices,
    user: &User,
) -> Result<(String, HeaderValue), axum::response::Response> {
    let token = services.issue_token(user).map_err(|e| {
        tracing::error!(error = %e, "failed to issue session token");
        errors::internal_error()
    })?;
    let cookie = services.carrier.attach(&token).map_err(|e| {
        tracing::error!(error = %e, "session token is not a valid header value");
        errors::internal_error()
    })?;
    Ok((token, cookie))
}

/// Hash on the blocking pool.
async fn hash_blocking(password: String) -> Result<String, axum::response::Response> {
    match tokio::task::spawn_blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => Ok(hash),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "password hashing failed");
            Err(errors::internal_error())
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing task failed");
            Err(errors::internal_error())
        }
    }
}
