use axum::{body::Body, response::Response};
use scraper::Html;

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    String::from_utf8(bytes.to_vec()).expect("Response body was not UTF-8")
}

/// Parse a full page rendered with [crate::html::base].
pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&body_text(response).await)
}

/// Parse a partial response such as an alert or a re-rendered form.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&body_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}
