use std::{convert::Infallible, net::SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};

use crate::content::SharedContent;
use crate::error::ApiError;
use crate::state::SharedState;

// --- Response Data ---

/// Body of `GET /api/info`. Field names are the wire contract.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub files: Vec<FileInfo>,
    pub description: String,
    pub snippet: String,
    pub is_empty: bool,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    pub file_size: String,
}

impl From<SharedContent> for InfoResponse {
    fn from(content: SharedContent) -> Self {
        let is_empty = content.is_empty();
        let files = content
            .files()
            .iter()
            .map(|entry| FileInfo {
                file_name: entry.name.clone(),
                file_size: entry.human_size.clone(),
            })
            .collect();

        Self {
            files,
            description: content.message,
            snippet: content.snippet,
            is_empty,
        }
    }
}

// --- Request Payloads ---

#[derive(Deserialize, Debug)]
pub struct DownloadQuery {
    file: Option<String>,
}

// --- Handlers ---

/// Lists what is currently shared.
pub async fn get_info(State(state): State<SharedState>) -> Result<Json<InfoResponse>, ApiError> {
    let content = state.snapshot().await?;
    Ok(Json(InfoResponse::from(content)))
}

/// Streams a shared file as an attachment, honouring `Range` requests.
pub async fn download(
    State(state): State<SharedState>,
    Query(query): Query<DownloadQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let name = query
        .file
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing `file` query parameter"))?;

    let content = state.snapshot().await?;
    let client = client_addr(&request);

    let Some(path) = content.path_for(&name) else {
        warn!(file_name = %name, %client, "download of unknown file");
        return Err(ApiError::not_found("file not found"));
    };

    // Range continuations of a transfer already logged stay quiet.
    if !is_range_request(request.headers()) {
        info!(file_name = %name, %client, "download started");
    }

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never: Infallible| match never {});

    let mut response = response.map(Body::new);
    if matches!(
        response.status(),
        StatusCode::OK | StatusCode::PARTIAL_CONTENT
    ) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, content_disposition(&name));
    }

    Ok(response.into_response())
}

// --- Utility Functions ---

pub fn is_range_request(headers: &HeaderMap) -> bool {
    headers.contains_key(header::RANGE)
}

/// Peer address recorded by the listener, or `unknown` when served without one.
pub fn client_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `attachment` disposition carrying the logical name, with an ASCII fallback
/// and the exact UTF-8 name in `filename*`.
fn content_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    );

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
