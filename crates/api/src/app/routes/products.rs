use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use storefront_auth::Policy;
use storefront_catalog::{CreateProduct, Product, UpdateProduct};
use storefront_core::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::CurrentIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/count", get(count_products))
        .route("/search", get(search_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/comments", get(product_comments))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.list_products().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn count_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.count_products().await {
        Ok(count) => (StatusCode::OK, Json(dto::CountResponse { count })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::SearchParams>,
) -> axum::response::Response {
    match services.store.search_products(params.query()).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match load_product(&services, &id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(res) => res,
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::enforce(Policy::AdminOnly, &current, None) {
        return res;
    }

    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store.create_product(body).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "product created");
            (StatusCode::CREATED, Json(product)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> axum::response::Response {
    let product = match load_product(&services, &id).await {
        Ok(p) => p,
        Err(res) => return res,
    };
    if let Err(res) = authz::enforce(Policy::AdminOnly, &current, None) {
        return res;
    }

    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store.update_product(product.id, body).await {
        Ok(Some(updated)) => (StatusCode::OK, Json(updated)).into_response(),
        Ok(None) => errors::not_found("product"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product = match load_product(&services, &id).await {
        Ok(p) => p,
        Err(res) => return res,
    };
    if let Err(res) = authz::enforce(Policy::AdminOnly, &current, None) {
        return res;
    }

    match services.store.delete_product(product.id).await {
        Ok(true) => {
            tracing::info!(product_id = %product.id, "product deleted");
            (
                StatusCode::OK,
                Json(dto::MessageResponse {
                    message: "Product deleted",
                }),
            )
                .into_response()
        }
        Ok(false) => errors::not_found("product"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn product_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product = match load_product(&services, &id).await {
        Ok(p) => p,
        Err(res) => return res,
    };

    match services.store.comments_for_product(product.id).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn load_product(
    services: &AppServices,
    raw_id: &str,
) -> Result<Product, axum::response::Response> {
    let id: ProductId = dto::parse_id(raw_id)?;
    match services.store.get_product(id).await {
        Ok(Some(product)) => Ok(product),
        Ok(None) => Err(errors::not_found("product")),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}
