pub mod orders;

use actix_web::HttpResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
    ),
    components(schemas(
        orders::CreateOrderRequest,
        orders::LineItemRequest,
        orders::UpdateOrderRequest,
        orders::OrderResponse,
        orders::LineItemResponse,
        orders::ListOrdersResponse,
    )),
    tags((name = "orders", description = "Order management"))
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
