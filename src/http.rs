//! axum integration: request body reading and JSON responses.

use axum::body::{self, Body, Bytes};
use axum::extract::Request;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::fields::Extract;
use crate::reader;
use crate::types::{Error, ReadConfig, Result};
use crate::writer::{self, ResponseSink};

/// Setting the body replaces whatever body the response carried.
impl ResponseSink for Response {
    fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers_mut().insert(name, value);
            }
            _ => tracing::warn!("Dropping invalid response header {}", name),
        }
    }

    fn write_body(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        *self.body_mut() = Body::from(bytes.to_vec());
        Ok(())
    }
}

/// JSON response built with [`writer::write`].
#[derive(Debug, Clone)]
pub struct JsonResponse<T>(pub T);

impl<T: Serialize> IntoResponse for JsonResponse<T> {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        match writer::write(&mut response, &self.0) {
            Ok(()) => response,
            Err(err) => {
                tracing::error!("Response encoding failed: {}", err);
                err.into_response()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.to_string()).into_response()
    }
}

/// Decode the whole request body into `dst`, replacing its value.
pub async fn read_request<T>(req: Request, dst: &mut T, config: &ReadConfig) -> Result<()>
where
    T: DeserializeOwned,
{
    let bytes = collect(req, config).await?;
    reader::decode(&bytes, dst)
}

/// Decode only the whitelisted keys of the request body into `dst`.
pub async fn read_request_filtered<T, S>(
    req: Request,
    dst: &mut T,
    whitelist: &[S],
    config: &ReadConfig,
) -> Result<()>
where
    T: Extract + ?Sized,
    S: AsRef<str>,
{
    let bytes = collect(req, config).await?;
    reader::decode_filtered(&bytes, dst, whitelist)
}

async fn collect(req: Request, config: &ReadConfig) -> Result<Bytes> {
    let limit = config.max_body_bytes;
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        tracing::debug!("Rejecting request body larger than {} bytes", limit);
        return Err(Error::BodyTooLarge { limit });
    }

    body::to_bytes(req.into_body(), limit).await.map_err(|err| {
        if exceeds_limit(&err) {
            tracing::debug!("Rejecting request body larger than {} bytes", limit);
            Error::BodyTooLarge { limit }
        } else {
            Error::Io(std::io::Error::other(err))
        }
    })
}

/// Streamed bodies only reveal their size while being read.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}
