use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Forward the caller's `x-request-id` or mint one, and make sure the
/// response carries it so clients and logs can correlate.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = match req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        Some(incoming) => incoming.to_string(),
        None => {
            let minted = Uuid::new_v4().to_string();
            if let Ok(header_value) = HeaderValue::from_str(&minted) {
                req.headers_mut().insert(REQUEST_ID_HEADER, header_value);
            }
            minted
        }
    };

    let mut response = next.run(req).await;

    if !response.headers().contains_key(REQUEST_ID_HEADER) {
        if let Ok(header_value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER, header_value);
        }
    }

    response
}
