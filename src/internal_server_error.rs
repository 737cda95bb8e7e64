//! The page shown when the server fails in a way the user cannot fix.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// A 500 page with a description of the failure and a hint for fixing it.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "問題が発生しました",
            fix: "しばらくしてからもう一度お試しください。",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("サーバーエラー", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

/// Send an htmx request to the error page.
///
/// Full page loads should redirect with `axum::response::Redirect` instead.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{assert_hx_redirect, assert_valid_html, parse_html_document},
    };

    use super::{
        InternalServerError, get_internal_server_error_page, get_internal_server_error_redirect,
    };

    #[tokio::test]
    async fn renders_error_page() {
        let response = get_internal_server_error_page().await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
    }

    #[tokio::test]
    async fn shows_description_and_fix() {
        let response = InternalServerError {
            description: "タイムゾーンが不正です",
            fix: "サーバーの設定を確認してください。",
        }
        .into_response();

        let html = parse_html_document(response).await;
        let text: Vec<String> = html
            .select(&Selector::parse("section p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect();
        assert_eq!(
            text,
            ["タイムゾーンが不正です", "サーバーの設定を確認してください。"]
        );
    }

    #[test]
    fn redirect_points_at_error_page() {
        let response = get_internal_server_error_redirect();

        assert_hx_redirect(&response, endpoints::INTERNAL_ERROR_VIEW);
    }
}
