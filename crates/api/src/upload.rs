//! Spreadsheet upload extractor.
//!
//! Reads the multipart field named `file`. A file with a content type other
//! than CSV/Excel, or larger than the configured cap, is dropped: the handler
//! receives `Upload(None)` exactly as if nothing had been attached.

use axum::async_trait;
use axum::extract::{FromRef, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use bytes::{Bytes, BytesMut};

use teatrade_infra::config::UploadSettings;
use teatrade_trading::SheetFormat;

use crate::app::errors::ApiError;

pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub format: SheetFormat,
    pub bytes: Bytes,
}

/// The uploaded spreadsheet, if an acceptable one was attached.
#[derive(Debug, Clone)]
pub struct Upload(pub Option<UploadedFile>);

impl Upload {
    /// The file, or the 400 every upload route answers when there is none.
    pub fn require(self) -> Result<UploadedFile, ApiError> {
        self.0.ok_or_else(|| ApiError::bad_request("no file uploaded"))
    }
}

#[async_trait]
impl<S> FromRequest<S> for Upload
where
    S: Send + Sync,
    UploadSettings: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let limits = UploadSettings::from_ref(state);

        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"));
        if !is_multipart {
            return Ok(Self(None));
        }

        let mut multipart = match Multipart::from_request(req, state).await {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable multipart body");
                return Ok(Self(None));
            }
        };

        loop {
            let mut field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => return Ok(Self(None)),
                Err(e) => {
                    tracing::debug!(error = %e, "malformed multipart body");
                    return Ok(Self(None));
                }
            };
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            let content_type = field.content_type().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_owned);
            let Some(format) = SheetFormat::from_content_type(&content_type) else {
                tracing::info!(content_type = %content_type, "dropping upload with unsupported type");
                return Ok(Self(None));
            };

            let mut buf = BytesMut::new();
            loop {
                match field.chunk().await {
                    Ok(Some(chunk)) => {
                        if buf.len() + chunk.len() > limits.max_bytes {
                            tracing::info!(max_bytes = limits.max_bytes, "dropping oversized upload");
                            return Ok(Self(None));
                        }
                        buf.extend_from_slice(&chunk);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(error = %e, "upload stream failed");
                        return Ok(Self(None));
                    }
                }
            }

            return Ok(Self(Some(UploadedFile {
                file_name,
                content_type,
                format,
                bytes: buf.freeze(),
            })));
        }
    }
}
