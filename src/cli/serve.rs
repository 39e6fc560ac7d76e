use super::room_sync;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::sheets::{SheetOperations, TokenSource};
use crate::sync::{RoomCache, RoomSync};
use serde::Serialize;
use serde_json::{Value, json};
use tiny_http::{Header, Method, Response, Server};
use tokio::runtime::Handle;
use tracing::{info, warn};
use url::Url;

const SHEETS_ROUTE: &str = "/api/sheets";

#[derive(Debug)]
pub(crate) struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn json<T: Serialize>(success: bool, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self {
                status: if success { 200 } else { 500 },
                body,
            },
            Err(e) => Self::error(500, &format!("Failed to serialize response: {}", e)),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({"success": false, "error": message}),
        }
    }
}

pub async fn execute(bind: &str) -> Result<()> {
    let config = Config::load()?;
    let sync = room_sync(&config)?;

    let server = Server::http(bind)
        .map_err(|e| AppError::Config(format!("Failed to bind to {}: {}", bind, e)))?;
    info!(%bind, route = SHEETS_ROUTE, "Serving room data");

    // tiny_http is blocking; requests are handled one at a time on a
    // dedicated thread and driven back into the runtime
    let runtime = Handle::current();
    tokio::task::spawn_blocking(move || {
        for request in server.incoming_requests() {
            let response = runtime.block_on(handle(&sync, request.method(), request.url()));
            info!(
                method = %request.method(),
                url = request.url(),
                status = response.status,
                "Handled request"
            );

            let mut http = Response::from_string(response.body.to_string())
                .with_status_code(response.status);
            if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            {
                http = http.with_header(header);
            }

            if let Err(e) = request.respond(http) {
                warn!(error = %e, "Failed to send response");
            }
        }
    })
    .await
    .map_err(|e| AppError::Other(e.into()))?;

    Ok(())
}

/// Route a request to the sync component.
///
/// - `GET /api/sheets` serves cached or fresh room data
/// - `GET /api/sheets?action=test` runs the access diagnostic
/// - `POST /api/sheets` clears the cache and forces a refresh
pub(crate) async fn handle<A, S, C>(
    sync: &RoomSync<A, S, C>,
    method: &Method,
    url: &str,
) -> ApiResponse
where
    A: TokenSource + Sync,
    S: SheetOperations + Sync,
    C: RoomCache,
{
    let Ok(url) = Url::parse(&format!("http://localhost{}", url)) else {
        return ApiResponse::error(400, "Malformed request URL");
    };

    if url.path().trim_end_matches('/') != SHEETS_ROUTE {
        return ApiResponse::error(404, "Not found");
    }

    let action = url
        .query_pairs()
        .find(|(key, _)| key == "action")
        .map(|(_, value)| value.into_owned());

    match (method, action.as_deref()) {
        (Method::Get, Some("test")) => {
            let diagnosis = sync.diagnose().await;
            ApiResponse::json(diagnosis.success, &diagnosis)
        }
        (Method::Get, _) => {
            let result = sync.fetch_all(false).await;
            ApiResponse::json(result.success, &result)
        }
        (Method::Post, _) => {
            sync.invalidate();
            let result = sync.fetch_all(true).await;
            ApiResponse::json(result.success, &result)
        }
        _ => ApiResponse::error(405, "Method not allowed"),
    }
}
