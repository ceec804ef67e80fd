//! Success envelope and pagination.

use axum::response::{IntoResponse, Response};
use axum::Json;
use roster_kit::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// `{"status": 200, "message": "Ok", "data": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: "Ok".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A message without data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// `?page=&page_size=`, 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total_item: usize,
    pub data: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_page: usize,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total_item: usize, params: &PageParams) -> Self {
        let page_size = params.page_size();
        Self {
            total_item,
            data,
            page: params.page(),
            page_size,
            total_page: total_item.div_ceil(page_size),
        }
    }
}
