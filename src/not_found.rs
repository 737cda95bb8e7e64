//! The page shown when no route or record matches the request.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    let page = error_view(
        "ページが見つかりません",
        "404",
        "ページが見つかりません",
        "お探しのページは存在しないか、削除された可能性があります。",
    );

    (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::test_utils::{assert_valid_html, parse_html_document};

    use super::get_404_not_found;

    #[tokio::test]
    async fn renders_404_page() {
        let response = get_404_not_found().await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let title = html
            .select(&Selector::parse("title").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(title, "ページが見つかりません - MoneyFlow");
    }
}
