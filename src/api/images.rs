use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, ImageDto};
use crate::db::NewImage;

/// POST /images/upload (admin, multipart)
///
/// Fields: `file` (required), `product_id` and/or `variant_id`, `alt_text`,
/// `is_primary`, `sort_order`. The file is stored under a generated name and
/// exposed back as a static `/uploads/...` path.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImageDto>>, ApiError> {
    current.ensure_admin()?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut product_id: Option<i32> = None;
    let mut variant_id: Option<i32> = None;
    let mut alt_text: Option<String> = None;
    let mut is_primary = false;
    let mut sort_order = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            "product_id" => {
                let text = read_text_field(field).await?;
                product_id = Some(parse_field("product_id", &text)?);
            }
            "variant_id" => {
                let text = read_text_field(field).await?;
                variant_id = Some(parse_field("variant_id", &text)?);
            }
            "alt_text" => alt_text = Some(read_text_field(field).await?),
            "is_primary" => {
                let text = read_text_field(field).await?;
                is_primary = text == "true" || text == "1";
            }
            "sort_order" => {
                let text = read_text_field(field).await?;
                sort_order = parse_field("sort_order", &text)?;
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::validation("A file is required"))?;

    if product_id.is_none() && variant_id.is_none() {
        return Err(ApiError::validation(
            "Either product_id or variant_id is required",
        ));
    }

    if let Some(product_id) = product_id
        && state.store().get_product(product_id).await?.is_none()
    {
        return Err(ApiError::not_found("Product", product_id));
    }
    if let Some(variant_id) = variant_id
        && state.store().get_variant(variant_id).await?.is_none()
    {
        return Err(ApiError::not_found("Variant", variant_id));
    }

    let url = state.uploads().save(&filename, &bytes).await?;

    let image = state
        .store()
        .create_image(NewImage {
            product_id,
            variant_id,
            url,
            alt_text,
            is_primary,
            sort_order,
        })
        .await?;

    Ok(Json(ApiResponse::success(ImageDto::from(image))))
}

/// DELETE /images/{id} (admin) — removes the row and the local file.
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    current.ensure_admin()?;

    let image = state
        .store()
        .get_image(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Image", id))?;

    state.uploads().delete(&image.url).await?;
    let deleted = state.store().remove_image(id).await?;

    Ok(Json(ApiResponse::success(deleted)))
}

/// GET /products/{id}/images
pub async fn list_product_images(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ImageDto>>>, ApiError> {
    if state.store().get_product(product_id).await?.is_none() {
        return Err(ApiError::not_found("Product", product_id));
    }

    let images = state.store().list_images_for_product(product_id).await?;
    let dtos: Vec<ImageDto> = images.into_iter().map(ImageDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart field: {e}")))
}

fn parse_field<T: std::str::FromStr>(name: &str, text: &str) -> Result<T, ApiError> {
    text.parse()
        .map_err(|_| ApiError::validation(format!("Invalid value for {name}: '{text}'")))
}
