use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use storefront_auth::Policy;
use storefront_catalog::{CreateComment, UpdateComment};
use storefront_core::{CommentId, UserId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::CurrentIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route("/:id", put(update_comment).delete(delete_comment))
}

pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    payload: Result<Json<CreateComment>, JsonRejection>,
) -> axum::response::Response {
    let identity = match authz::authenticated(&current) {
        Ok(i) => i,
        Err(res) => return res,
    };

    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store.get_product(body.product_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found("product"),
        Err(e) => return errors::store_error_to_response(e),
    }

    // Author is always the caller.
    match services.store.create_comment(body.by(identity.id)).await {
        Ok(comment) => {
            tracing::info!(comment_id = %comment.id, product_id = %comment.product_id, "comment created");
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
) -> axum::response::Response {
    if let Err(res) = authz::enforce(Policy::AdminOnly, &current, None) {
        return res;
    }

    match services.store.list_comments().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateComment>, JsonRejection>,
) -> axum::response::Response {
    let (id, owner) = match load_owner(&services, &id).await {
        Ok(found) => found,
        Err(res) => return res,
    };
    if let Err(res) = authz::enforce(Policy::OwnerOnly, &current, Some(owner)) {
        return res;
    }

    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store.update_comment(id, body.text).await {
        Ok(Some(updated)) => (StatusCode::OK, Json(updated)).into_response(),
        Ok(None) => errors::not_found("comment"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let (id, owner) = match load_owner(&services, &id).await {
        Ok(found) => found,
        Err(res) => return res,
    };
    if let Err(res) = authz::enforce(Policy::OwnerOrAdmin, &current, Some(owner)) {
        return res;
    }

    match services.store.delete_comment(id).await {
        Ok(true) => {
            tracing::info!(comment_id = %id, "comment deleted");
            (
                StatusCode::OK,
                Json(dto::MessageResponse {
                    message: "Comment deleted",
                }),
            )
                .into_response()
        }
        Ok(false) => errors::not_found("comment"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Resolves a comment id and its author; a missing comment is 404 for every caller.
async fn load_owner(
    services: &AppServices,
    raw_id: &str,
) -> Result<(CommentId, UserId), axum::response::Response> {
    let id: CommentId = dto::parse_id(raw_id)?;
    match services.store.comment_owner(id).await {
        Ok(Some(owner)) => Ok((id, owner)),
        Ok(None) => Err(errors::not_found("comment")),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}
