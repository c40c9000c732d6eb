use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{LineItem, Order, OrderId, StatusTransition};
use crate::domain::page::{Cursor, FindAllPage};
use crate::errors::AppError;
use crate::AppState;

/// Upper bound for the `size` query parameter.
pub const MAX_PAGE_SIZE: u64 = 100;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct LineItemRequest {
    pub item_id: Uuid,
    pub quantity: u32,
    /// Price in minor currency units, e.g. 6000 for 60.00
    pub price: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    /// Either "shipped" or "completed"
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LineItemResponse {
    pub item_id: Uuid,
    pub quantity: u32,
    pub price: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: u64,
    pub customer_id: Uuid,
    pub line_items: Vec<LineItemResponse>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id.0,
            customer_id: order.customer_id,
            status: order.status().as_str().to_string(),
            line_items: order
                .line_items
                .into_iter()
                .map(|l| LineItemResponse {
                    item_id: l.item_id,
                    quantity: l.quantity,
                    price: l.price,
                })
                .collect(),
            created_at: order.created_at,
            shipped_at: order.shipped_at,
            completed_at: order.completed_at,
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Cursor returned as `next` by the previous page. Defaults to 0 (start).
    #[serde(default)]
    pub cursor: u64,
    /// Batch size hint. Defaults to the configured page size, maximum 100.
    pub size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    /// Cursor for the next page; 0 once the listing is complete.
    pub next: u64,
}

fn parse_id(raw: &str) -> Result<OrderId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid order id '{}'", raw)))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /
///
/// Liveness check.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// POST /orders
///
/// Creates an order with a server-generated id. The order record and its
/// index entry are written as one atomic unit.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Malformed body or zero quantity"),
        (status = 409, description = "Order id already taken"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let line_items = body
        .line_items
        .into_iter()
        .map(|l| LineItem {
            item_id: l.item_id,
            quantity: l.quantity,
            price: l.price,
        })
        .collect();

    let cx = state.context();
    let order = state
        .orders
        .create_order(&cx, body.customer_id, line_items)
        .await?;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns one page of orders. Pages come from an incremental scan, so
/// their length can differ from `size`; keep following `next` until it is 0.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("cursor" = Option<u64>, Query, description = "Scan cursor (default 0)"),
        ("size" = Option<u64>, Query, description = "Batch size hint (max 100)"),
    ),
    responses(
        (status = 200, description = "One page of orders", body = ListOrdersResponse),
        (status = 400, description = "Malformed cursor or size"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let size = params
        .size
        .unwrap_or(state.list_page_size)
        .clamp(1, MAX_PAGE_SIZE);

    let cx = state.context();
    let result = state
        .orders
        .list_orders(
            &cx,
            FindAllPage {
                cursor: Cursor::from(params.cursor),
                size,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.orders.into_iter().map(OrderResponse::from).collect(),
        next: result.cursor.into(),
    }))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = u64, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path)?;

    let cx = state.context();
    let order = state.orders.get_order(&cx, id).await?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}
///
/// Moves the order to `shipped` or `completed`. Transitions that skip a
/// step or repeat one are rejected without writing anything.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(
        ("id" = u64, Path, description = "Order id"),
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Malformed request or invalid status transition"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path)?;
    let transition = body
        .status
        .parse::<StatusTransition>()
        .map_err(DomainError::from)?;

    let cx = state.context();
    let order = state.orders.update_status(&cx, id, transition).await?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /orders/{id}
///
/// Removes the order and its index entry together.
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = u64, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path)?;

    let cx = state.context();
    state.orders.delete_order(&cx, id).await?;

    Ok(HttpResponse::Ok().finish())
}
