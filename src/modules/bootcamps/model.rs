use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::AppError;
use crate::utils::query::{Column, ColumnKind, QueryTarget};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub careers: Vec<String>,
    pub average_cost: Option<f64>,
    pub photo: Option<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    #[serde(rename = "user")]
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBootcampRequest {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description can not be more than 500 characters"
    ))]
    pub description: String,
    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,
    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub careers: Vec<String>,
    pub average_cost: Option<f64>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBootcampRequest {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: Option<String>,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description can not be more than 500 characters"
    ))]
    pub description: Option<String>,
    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub careers: Option<Vec<String>>,
    pub average_cost: Option<f64>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

/// URL-safe slug derived from the bootcamp name.
pub fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Validator for bootcamp photo uploads.
pub struct PhotoValidator;

impl PhotoValidator {
    /// Validate content type and size against the configured cap.
    pub fn validate(
        content_type: Option<&str>,
        size_bytes: usize,
        max_bytes: usize,
    ) -> Result<(), AppError> {
        let content_type = content_type.ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("Please upload an image file"))
        })?;

        if !content_type.starts_with("image/") {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Please upload an image file"
            )));
        }

        if size_bytes > max_bytes {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Please upload an image less than {max_bytes} bytes"
            )));
        }

        Ok(())
    }

    /// File extension for the stored photo, derived from the MIME type.
    pub fn extension(content_type: &str) -> &'static str {
        match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "img",
        }
    }
}

/// Queryable surface of the bootcamps collection.
pub const BOOTCAMP_TARGET: QueryTarget = QueryTarget {
    table: "bootcamps",
    columns: &[
        Column {
            name: "name",
            sql: "name",
            kind: ColumnKind::Text,
        },
        Column {
            name: "slug",
            sql: "slug",
            kind: ColumnKind::Text,
        },
        Column {
            name: "description",
            sql: "description",
            kind: ColumnKind::Text,
        },
        Column {
            name: "website",
            sql: "website",
            kind: ColumnKind::Text,
        },
        Column {
            name: "phone",
            sql: "phone",
            kind: ColumnKind::Text,
        },
        Column {
            name: "email",
            sql: "email",
            kind: ColumnKind::Text,
        },
        Column {
            name: "address",
            sql: "address",
            kind: ColumnKind::Text,
        },
        Column {
            name: "careers",
            sql: "careers",
            kind: ColumnKind::TextArray,
        },
        Column {
            name: "averageCost",
            sql: "average_cost",
            kind: ColumnKind::Number,
        },
        Column {
            name: "photo",
            sql: "photo",
            kind: ColumnKind::Text,
        },
        Column {
            name: "housing",
            sql: "housing",
            kind: ColumnKind::Bool,
        },
        Column {
            name: "jobAssistance",
            sql: "job_assistance",
            kind: ColumnKind::Bool,
        },
        Column {
            name: "jobGuarantee",
            sql: "job_guarantee",
            kind: ColumnKind::Bool,
        },
        Column {
            name: "acceptGi",
            sql: "accept_gi",
            kind: ColumnKind::Bool,
        },
        Column {
            name: "createdAt",
            sql: "created_at",
            kind: ColumnKind::Timestamp,
        },
    ],
    default_sort: "created_at",
};
