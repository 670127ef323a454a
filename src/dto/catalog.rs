use axum::body::Bytes;
use axum::extract::multipart::{Field, Multipart};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Brand, Product};

/// One image part pulled out of a multipart form. Empty file inputs (a
/// browser submits them even when nothing was picked) are treated as absent.
#[derive(Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub data: Bytes,
}

#[derive(Debug)]
pub struct CreateBrandForm {
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<UploadedFile>,
}

#[derive(Debug, Default)]
pub struct UpdateBrandForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<UploadedFile>,
}

#[derive(Debug)]
pub struct CreateProductForm {
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub quantity_available: i32,
    pub brand_id: Uuid,
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Default)]
pub struct UpdateProductForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub quantity_available: Option<i32>,
    pub is_active: Option<bool>,
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandList {
    pub items: Vec<Brand>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandWithProducts {
    pub brand: Brand,
    pub products: Vec<Product>,
}

impl CreateBrandForm {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut name = None;
        let mut description = None;
        let mut logo = None;

        while let Some(field) = next_field(&mut multipart).await? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("name") => name = Some(text(field).await?),
                Some("description") => description = Some(text(field).await?),
                Some("logo") => logo = file(field).await?,
                _ => {}
            }
        }

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::BadRequest("name is required".into()))?;

        Ok(Self {
            name,
            description,
            logo,
        })
    }
}

impl UpdateBrandForm {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = next_field(&mut multipart).await? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("name") => form.name = Some(text(field).await?),
                Some("description") => form.description = Some(text(field).await?),
                Some("logo") => form.logo = file(field).await?,
                _ => {}
            }
        }

        if let Some(name) = &form.name {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest("name must not be empty".into()));
            }
        }

        Ok(form)
    }
}

impl CreateProductForm {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut title = None;
        let mut description = None;
        let mut price = None;
        let mut quantity_available = None;
        let mut brand_id = None;
        let mut image = None;

        while let Some(field) = next_field(&mut multipart).await? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("title") => title = Some(text(field).await?),
                Some("description") => description = Some(text(field).await?),
                Some("price") => price = Some(parse::<i64>("price", field).await?),
                Some("quantity_available") => {
                    quantity_available = Some(parse::<i32>("quantity_available", field).await?)
                }
                Some("brand_id") => brand_id = Some(parse::<Uuid>("brand_id", field).await?),
                Some("image") => image = file(field).await?,
                _ => {}
            }
        }

        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("title is required".into()))?;
        let price =
            price.ok_or_else(|| AppError::BadRequest("price is required".into()))?;
        let brand_id =
            brand_id.ok_or_else(|| AppError::BadRequest("brand_id is required".into()))?;

        Ok(Self {
            title,
            description,
            price,
            quantity_available: quantity_available.unwrap_or(0),
            brand_id,
            image,
        })
    }
}

impl UpdateProductForm {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = next_field(&mut multipart).await? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("title") => form.title = Some(text(field).await?),
                Some("description") => form.description = Some(text(field).await?),
                Some("price") => form.price = Some(parse::<i64>("price", field).await?),
                Some("quantity_available") => {
                    form.quantity_available =
                        Some(parse::<i32>("quantity_available", field).await?)
                }
                Some("is_active") => {
                    form.is_active = Some(parse::<bool>("is_active", field).await?)
                }
                Some("image") => form.image = file(field).await?,
                _ => {}
            }
        }

        if let Some(title) = &form.title {
            if title.trim().is_empty() {
                return Err(AppError::BadRequest("title must not be empty".into()));
            }
        }

        Ok(form)
    }
}

async fn next_field<'a>(multipart: &'a mut Multipart) -> AppResult<Option<Field<'a>>> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable form field: {e}")))
}

async fn parse<T: std::str::FromStr>(name: &str, field: Field<'_>) -> AppResult<T> {
    text(field)
        .await?
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::BadRequest(format!("invalid value for {name}")))
}

async fn file(field: Field<'_>) -> AppResult<Option<UploadedFile>> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable file field: {e}")))?;
    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        original_name,
        data,
    }))
}
