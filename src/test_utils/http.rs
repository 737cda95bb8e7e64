use axum::{
    body::Body,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    response::Response,
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key},
};

#[track_caller]
pub(crate) fn assert_status_ok(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    let content_type_header = response
        .headers()
        .get("content-type")
        .expect("content-type header missing");
    assert_eq!(content_type_header, content_type);
}

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let header_error_message = format!("Headers missing {header_name}");

    response
        .headers()
        .get(header_name)
        .expect(&header_error_message)
        .to_str()
        .expect("Could not convert to str")
        .to_string()
}

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}

/// Build a cookie jar from the `Set-Cookie` headers of `response`, as a browser would send them
/// back on the next request.
#[track_caller]
pub(crate) fn jar_from_set_cookie(response: &Response<Body>, key: Key) -> PrivateCookieJar {
    let cookie_pairs: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|header| {
            let cookie = Cookie::parse(header.to_str().expect("Could not convert to str"))
                .expect("Could not parse cookie");
            format!("{}={}", cookie.name(), cookie.value())
        })
        .collect();
    assert!(!cookie_pairs.is_empty(), "response did not set any cookies");

    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&cookie_pairs.join("; ")).expect("Invalid cookie header"),
    );

    PrivateCookieJar::from_headers(&headers, key)
}
