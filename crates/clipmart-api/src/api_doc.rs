//! OpenAPI document.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::authorize::{AuthorizeUploadRequest, AuthorizeUploadResponse};
use crate::handlers::publish::PublishItemRequest;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::authorize::authorize_upload,
        crate::handlers::publish::publish_item,
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
    ),
    components(schemas(
        AuthorizeUploadRequest,
        AuthorizeUploadResponse,
        PublishItemRequest,
        ErrorResponse,
    )),
    tags(
        (name = "uploads", description = "Direct-transfer authorization"),
        (name = "items", description = "Catalog publication and reads")
    )
)]
pub struct ApiDoc;
