//! `application/problem+json` error bodies (RFC 7807).

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `type` used when the status code alone describes the problem.
pub const BLANK_PROBLEM: &str = "about:blank";

#[derive(Debug, Serialize)]
struct ProblemBody {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    detail: String,
}

#[derive(Debug)]
pub struct ProblemResponse {
    status: StatusCode,
    allow: Option<&'static str>,
    body: ProblemBody,
}

impl ProblemResponse {
    fn blank(status: StatusCode, detail: String) -> Self {
        Self {
            status,
            allow: None,
            body: ProblemBody {
                kind: BLANK_PROBLEM,
                title: status.canonical_reason().unwrap_or("Error"),
                detail,
            },
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::blank(StatusCode::NOT_FOUND, format!("no route matches {path}"))
    }

    /// 405 for `method` on `path`; `allow` is echoed in the `Allow` header.
    pub fn method_not_allowed(method: &str, path: &str, allow: &'static str) -> Self {
        let mut problem = Self::blank(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{method} is not supported on {path}"),
        );
        problem.allow = Some(allow);
        problem
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        if let Some(allow) = self.allow {
            headers.insert(header::ALLOW, HeaderValue::from_static(allow));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should read")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn not_found_renders_problem_json() {
        let response = ProblemResponse::not_found("/nowhere").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );
        assert!(response.headers().get(header::ALLOW).is_none());

        let body = body_json(response).await;
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["title"], "Not Found");
        assert_eq!(body["detail"], "no route matches /nowhere");
    }

    #[tokio::test]
    async fn method_not_allowed_sets_allow_header() {
        let response =
            ProblemResponse::method_not_allowed("POST", "/", "GET,HEAD").into_response();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET,HEAD");

        let body = body_json(response).await;
        assert_eq!(body["title"], "Method Not Allowed");
        assert_eq!(body["detail"], "POST is not supported on /");
    }
}
