//! OpenAPI document served at `/api-docs/openapi.json`, browsable at
//! `/docs`. Only the contract-bearing endpoints are annotated; plain CRUD
//! routes are discoverable from the router.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::errors::ErrorResponse;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "cartfleet-api",
        description = "Fleet-maintenance backend for golf-cart operations"
    ),
    paths(
        handlers::users::login,
        handlers::stock::transfer_stock,
        handlers::stock::stock_in,
        handlers::stock::stock_out,
        handlers::jobs::generate_requisition,
        handlers::health::health,
    ),
    components(schemas(
        ErrorResponse,
        handlers::users::LoginRequest,
        handlers::users::LoginResponse,
        handlers::stock::TransferRequest,
        handlers::stock::MovementRequest,
        handlers::jobs::RequisitionRequest,
        handlers::jobs::RequisitionResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Login and identity"),
        (name = "stock", description = "Spare-parts stock movements"),
        (name = "jobs", description = "Maintenance jobs and code generation"),
        (name = "diagnostics", description = "Health and metrics"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
