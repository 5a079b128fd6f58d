use crate::AppState;
use crate::config::normalize_folder;
use crate::error::StorageError;
use crate::handlers::constants::{PRIVATE_CACHE_CONTROL, PUBLIC_CACHE_CONTROL};
use crate::storage::StorageFacade;
use crate::utils::headers::guess_mime_type;
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

/// 选择目标目录的查询参数
///
/// `thumbnail=true` 时使用缩略图目录；否则使用 `folder`（会被规范化），
/// 两者都没有时使用配置中的目录。
#[derive(Debug, Default, Deserialize)]
pub struct FolderQuery {
    pub folder: Option<String>,
    #[serde(default)]
    pub thumbnail: bool,
}

impl FolderQuery {
    fn target_folder(&self, storage: &StorageFacade) -> Option<String> {
        target_folder(storage, self.folder.as_deref(), self.thumbnail)
    }
}

/// 上传请求的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// 用户看到的原始文件名，缺省时与存储文件名相同
    pub original_filename: Option<String>,
    pub folder: Option<String>,
    #[serde(default)]
    pub thumbnail: bool,
}

/// 对象位置
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectLocation {
    pub key: String,
    pub url: String,
}

fn target_folder(storage: &StorageFacade, folder: Option<&str>, thumbnail: bool) -> Option<String> {
    if thumbnail {
        Some(storage.thumb_folder().to_string())
    } else {
        folder.map(normalize_folder)
    }
}

async fn locate(
    storage: &StorageFacade,
    filename: &str,
    folder: Option<&str>,
) -> Result<ObjectLocation, StorageError> {
    let key = storage.object(filename, folder).key;
    let url = storage.object_url(filename, folder).await?;
    Ok(ObjectLocation { key, url })
}

/// 上传附件。
///
/// # 请求方法
///
/// PUT /files/{filename}[?original_filename=&folder=&thumbnail=]
///
/// Content-Type 取自请求头；没有时按原始文件名猜测，仍无法确定时使用
/// `application/octet-stream`。
///
/// # 返回值
///
/// `201 Created`，响应体为对象键和访问 URL。
pub async fn upload_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ObjectLocation>), StorageError> {
    let storage = &state.storage;
    let original_filename = query.original_filename.as_deref().unwrap_or(&filename);
    let folder = target_folder(storage, query.folder.as_deref(), query.thumbnail);

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| guess_mime_type(original_filename));

    storage
        .put(
            &filename,
            original_filename,
            body,
            content_type.as_deref(),
            folder.as_deref(),
        )
        .await?;

    let location = locate(storage, &filename, folder.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// 下载附件。
///
/// # 请求方法
///
/// GET /files/{filename}[?folder=&thumbnail=]
///
/// 代理模式下由本服务流式转发对象内容；否则重定向到对象的访问 URL
/// （私有对象为预签名 URL）。
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(query): Query<FolderQuery>,
) -> Result<Response, StorageError> {
    let storage = &state.storage;
    let folder = query.target_folder(storage);

    if !storage.config().proxy() {
        let url = storage.object_url(&filename, folder.as_deref()).await?;
        return Ok(Redirect::to(&url).into_response());
    }

    let object = storage.get(&filename, folder.as_deref()).await?;
    let mut response = Response::new(Body::from_stream(ReaderStream::new(
        object.body.into_async_read(),
    )));

    let headers = response.headers_mut();
    let metadata = [
        (header::CONTENT_TYPE, object.content_type),
        (header::CONTENT_DISPOSITION, object.content_disposition),
        (header::CONTENT_LENGTH, object.content_length.map(|len| len.to_string())),
    ];
    for (name, value) in metadata {
        // 后端返回的非法头部值直接丢弃
        if let Some(value) = value.and_then(|v| HeaderValue::from_str(&v).ok()) {
            headers.insert(name, value);
        }
    }
    let cache_control = if storage.config().is_private() {
        PRIVATE_CACHE_CONTROL
    } else {
        PUBLIC_CACHE_CONTROL
    };
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    Ok(response)
}

/// 删除附件，对不存在的文件同样返回 `204 No Content`。
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(query): Query<FolderQuery>,
) -> Result<StatusCode, StorageError> {
    let folder = query.target_folder(&state.storage);
    state.storage.delete(&filename, folder.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 查询附件的对象键和访问 URL。
///
/// # 请求方法
///
/// GET /urls/{filename}[?folder=&thumbnail=]
pub async fn file_url(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<ObjectLocation>, StorageError> {
    let folder = query.target_folder(&state.storage);
    let location = locate(&state.storage, &filename, folder.as_deref()).await?;
    Ok(Json(location))
}
