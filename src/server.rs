//! HTTP control panel
//!
//! `GET /` serves a single-page form, `POST /api/generate` runs a batch and
//! `GET /api/download/:file?dir=` returns a produced archive. All paths from
//! requests must resolve inside the server's base directory.
//!
//! Each request runs the synchronous pipeline on a blocking thread. Requests
//! that share an output or cache directory are not serialized.

use crate::config::{GeneratorConfig, ServerConfig};
use crate::error::PipelineError;
use crate::input::{read_csv_str, requests_from_identifiers};
use crate::job::JobOverrides;
use crate::pipeline::{BatchOptions, BatchReport, Pipeline};
use crate::site::{normalize_identifier, resolve_sites, SiteRequest};
use anyhow::Context;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

const INDEX_HTML: &str = include_str!("server/index.html");
const DEFAULT_OUTPUT: &str = "output";

/// Shared handler state
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Every request path must stay inside this directory
    pub base_dir: PathBuf,
    /// Template for per-request generator settings
    pub generator: GeneratorConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    pub faa_ids: Option<String>,
    pub csv_data: Option<String>,
    pub output_dir: Option<String>,
    pub jobs_dir: Option<String>,
    pub aoi_radius_m: Option<u32>,
    pub overrides: Option<JobOverrides>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub dir: Option<String>,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/generate", post(generate))
        .route("/api/download/:file", get(download))
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &ServerConfig, state: ServerState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, base_dir = %state.base_dir.display(), "Control panel listening");
    axum::serve(listener, router(Arc::new(state)).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Control panel stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn generate(State(state): State<Arc<ServerState>>, body: String) -> Response {
    let request: GenerateRequest = if body.trim().is_empty() {
        GenerateRequest::default()
    } else {
        match serde_json::from_str(&body) {
            Ok(request) => request,
            Err(_) => return json_error(StatusCode::BAD_REQUEST, "Invalid JSON payload."),
        }
    };

    let csv_requests = match read_csv_str(request.csv_data.as_deref().unwrap_or_default()) {
        Ok(requests) => requests,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let id_requests = requests_from_identifiers(request.faa_ids.as_deref().unwrap_or_default());
    let requests = combine_requests(id_requests, csv_requests);
    if requests.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Provide FAA IDs or a CSV file with faa_id values.",
        );
    }

    let output_arg = request
        .output_dir
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_OUTPUT);
    let Some(output_dir) = safe_resolve(&state.base_dir, output_arg) else {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Output directory must be inside the current workspace.",
        );
    };
    let jobs_arg = request
        .jobs_dir
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("{}/jobs", output_arg.trim_end_matches('/')));
    let Some(jobs_dir) = safe_resolve(&state.base_dir, &jobs_arg) else {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Jobs directory must be inside the current workspace.",
        );
    };

    let generator = GeneratorConfig {
        output_dir: output_dir.clone(),
        jobs_dir: Some(jobs_dir),
        cache_dir: state.generator.cache_dir.clone(),
        aoi_radius_m: request
            .aoi_radius_m
            .filter(|r| *r > 0)
            .unwrap_or(state.generator.aoi_radius_m),
        generator_version: state.generator.generator_version.clone(),
    };
    let options = BatchOptions {
        overrides: request.overrides.unwrap_or_default(),
        ..Default::default()
    };
    let batch = resolve_sites(&requests);

    let outcome =
        tokio::task::spawn_blocking(move || Pipeline::new(generator).run_batch(&batch, &options))
            .await;

    match outcome {
        Ok(Ok(report)) => {
            let dir_param = display_dir(&state.base_dir, &output_dir);
            Json(report_json(&report, &output_dir, &dir_param)).into_response()
        }
        Ok(Err(e)) => {
            let status = match e {
                PipelineError::NoSites => StatusCode::BAD_REQUEST,
                PipelineError::PathCollision { .. } => StatusCode::CONFLICT,
                PipelineError::OutputDir { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            json_error(status, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Generation task panicked or was cancelled");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Generation task failed.")
        }
    }
}

/// With explicit IDs, CSV rows only supply names and coordinates for those
/// IDs. Without them, the CSV is the site list.
fn combine_requests(ids: Vec<SiteRequest>, csv: Vec<SiteRequest>) -> Vec<SiteRequest> {
    if ids.is_empty() {
        return csv;
    }
    let wanted: HashSet<String> = ids
        .iter()
        .map(|r| normalize_identifier(&r.identifier))
        .collect();
    ids.into_iter()
        .chain(
            csv.into_iter()
                .filter(|r| wanted.contains(&normalize_identifier(&r.identifier))),
        )
        .collect()
}

fn report_json(report: &BatchReport, output_dir: &Path, dir_param: &str) -> Value {
    let results: Vec<Value> = report
        .packaged()
        .map(|result| {
            let zip_file = result
                .zip_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            json!({
                "faa_id": result.identifier,
                "name": result.slug,
                "zip_url": format!("/api/download/{}?dir={}", zip_file, dir_param),
                "zip_file": zip_file,
                "job_path": result.job_path,
                "scene_path": result.scene_path,
                "cache_hit": result.cache_hit,
            })
        })
        .collect();
    let failures: Vec<Value> = report
        .failures()
        .map(|failure| {
            json!({
                "faa_id": failure.identifier,
                "name": failure.slug,
                "kind": failure.kind,
                "error": failure.message,
            })
        })
        .collect();

    json!({
        "output_dir": output_dir,
        "results": results,
        "failures": failures,
    })
}

/// `dir` query value for download links: relative to the base when possible.
fn display_dir(base_dir: &Path, dir: &Path) -> String {
    let base = dunce::canonicalize(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());
    dir.strip_prefix(&base)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| dir.to_string_lossy().into_owned())
}

async fn download(
    State(state): State<Arc<ServerState>>,
    UrlPath(file): UrlPath<String>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let dir = query
        .dir
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let Some(directory) = safe_resolve(&state.base_dir, &dir) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid download directory.");
    };

    let is_plain_name = matches!(
        Path::new(&file).components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    );
    if !is_plain_name {
        return json_error(StatusCode::BAD_REQUEST, "Invalid download path.");
    }
    let Some(file_path) = safe_resolve(&directory, &file) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid download path.");
    };
    if !file_path.is_file() {
        return json_error(StatusCode::NOT_FOUND, "File not found.");
    }

    let read_path = file_path.clone();
    let bytes = match tokio::task::spawn_blocking(move || std::fs::read(read_path)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            error!(path = %file_path.display(), error = %e, "Download read failed");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file.");
        }
        Err(e) => {
            error!(error = %e, "Download task failed");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file.");
        }
    };

    let disposition = format!("attachment; filename=\"{}\"", file.replace('"', ""));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// Resolve `target` against `base_dir`, returning `None` when the result
/// escapes `base_dir`.
///
/// Existing paths are canonicalized so symlinks cannot escape; paths that do
/// not exist yet are normalized lexically.
pub fn safe_resolve(base_dir: &Path, target: &str) -> Option<PathBuf> {
    if target.trim().is_empty() {
        return None;
    }
    let base = dunce::canonicalize(base_dir).ok()?;
    let target = Path::new(target);
    let joined = if target.is_absolute() {
        target.to_path_buf()
    } else {
        base.join(target)
    };

    let resolved = match dunce::canonicalize(&joined) {
        Ok(path) => path,
        Err(_) => normalize_lexically(&joined)?,
    };
    if resolved.starts_with(&base) {
        Some(resolved)
    } else {
        None
    }
}

fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state(base: &Path) -> Arc<ServerState> {
        Arc::new(ServerState {
            base_dir: base.to_path_buf(),
            generator: GeneratorConfig::default(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_safe_resolve_stays_inside_base() {
        let temp_dir = TempDir::new().unwrap();
        let base = dunce::canonicalize(temp_dir.path()).unwrap();

        assert_eq!(safe_resolve(&base, "output"), Some(base.join("output")));
        assert_eq!(
            safe_resolve(&base, "output/../jobs"),
            Some(base.join("jobs"))
        );
        assert_eq!(safe_resolve(&base, "../elsewhere"), None);
        assert_eq!(safe_resolve(&base, "/etc"), None);
        assert_eq!(safe_resolve(&base, ""), None);
    }

    #[test]
    fn test_combine_requests_filters_csv_by_ids() {
        let ids = requests_from_identifiers("12pa");
        let csv = read_csv_str("faa_id,name\n12PA,Mercy\n99XY,Other\n").unwrap();
        let combined = combine_requests(ids, csv.clone());
        let batch = resolve_sites(&combined);
        assert_eq!(batch.sites.len(), 1);
        assert_eq!(batch.sites[0].slug, "Mercy");

        let batch = resolve_sites(&combine_requests(Vec::new(), csv));
        assert_eq!(batch.sites.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_json_and_empty_input() {
        let temp_dir = TempDir::new().unwrap();
        let response = generate(State(state(temp_dir.path())), "{nope".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid JSON payload.");

        let response = generate(State(state(temp_dir.path())), "{}".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_rejects_escaping_output() {
        let temp_dir = TempDir::new().unwrap();
        let body = json!({ "faa_ids": "12PA", "output_dir": "../outside" }).to_string();
        let response = generate(State(state(temp_dir.path())), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generate_then_download() {
        let temp_dir = TempDir::new().unwrap();
        let shared = state(temp_dir.path());
        let body = json!({
            "faa_ids": "12pa",
            "csv_data": "faa_id,name,lat,lon\n12PA,Mercy Hospital,40.44,-79.99\n",
            "output_dir": "out",
        })
        .to_string();

        let response = generate(State(shared.clone()), body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        let result = &payload["results"][0];
        assert_eq!(result["faa_id"], "12PA");
        assert_eq!(result["zip_file"], "HOSP_12PA_Mercy_Hospital.zip");
        assert_eq!(
            result["zip_url"],
            "/api/download/HOSP_12PA_Mercy_Hospital.zip?dir=out"
        );
        assert!(payload["failures"].as_array().unwrap().is_empty());

        let response = download(
            State(shared.clone()),
            UrlPath("HOSP_12PA_Mercy_Hospital.zip".to_string()),
            Query(DownloadQuery {
                dir: Some("out".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = download(
            State(shared.clone()),
            UrlPath("missing.zip".to_string()),
            Query(DownloadQuery {
                dir: Some("out".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = download(
            State(shared),
            UrlPath("..".to_string()),
            Query(DownloadQuery {
                dir: Some("out".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_path_like_identifier_is_a_site_failure() {
        let temp_dir = TempDir::new().unwrap();
        let shared = state(temp_dir.path());
        let body = json!({
            "faa_ids": "../../escape",
            "output_dir": "out",
        })
        .to_string();

        let response = generate(State(shared), body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert!(payload["results"].as_array().unwrap().is_empty());
        assert_eq!(payload["failures"][0]["faa_id"], "../../ESCAPE");
        assert_eq!(payload["failures"][0]["kind"], "input");
        assert!(!temp_dir.path().join("ESCAPE_UNKNOWN").exists());
        assert!(!temp_dir.path().join("out/jobs").exists());
    }
}
