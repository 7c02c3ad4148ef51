use std::io::Read;
use std::sync::Arc;

use http::Method;
use may_minihttp::Request as HttpRequest;
use serde_json::Value;
use tracing::{debug, info};

use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::request::Request;
use crate::response::HeaderVec;

/// Why a raw request could not be turned into a [`Request`].
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    UnsupportedMethod(String),
}

/// Split a `Cookie` header into name/value pairs.
pub fn parse_cookies(header: &str) -> HeaderVec {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((Arc::from(name), value.to_string()))
        })
        .collect()
}

/// URL-decoded query parameters of `path`, in order of appearance.
pub fn parse_query_params(path: &str) -> Vec<(String, String)> {
    match path.split_once('?') {
        Some((_, query)) => parse_form(query),
        None => Vec::new(),
    }
}

fn parse_form(encoded: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(encoded.split('#').next().unwrap_or("").as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Convert a `may_minihttp` request into a pipeline [`Request`].
///
/// Query parameters come first, then form-encoded body fields, later keys
/// replacing earlier ones. A JSON body (or any body that parses as JSON) is
/// kept as the request body.
pub fn parse_request(req: HttpRequest) -> Result<Request, ParseError> {
    let raw_method = req.method().to_string();
    let method = Method::from_bytes(raw_method.as_bytes())
        .map_err(|_| ParseError::UnsupportedMethod(raw_method.clone()))?;
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let mut headers = HeaderVec::new();
    for h in req.headers().iter() {
        headers.push((Arc::from(h.name), String::from_utf8_lossy(h.value).into_owned()));
    }
    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };
    let request_id = RequestId::from_header_or_new(header(REQUEST_ID_HEADER));
    let cookies = header("cookie").map(parse_cookies).unwrap_or_default();
    let content_type = header("content-type").map(str::to_ascii_lowercase);
    debug!(
        request_id = %request_id,
        header_count = headers.len(),
        cookie_count = cookies.len(),
        "Headers extracted"
    );

    let mut builder = Request::builder(method, path).request_id(request_id);
    builder = builder.params(parse_query_params(&raw_path));

    // body last: reading it consumes the request
    let mut body = String::new();
    if let Ok(size) = req.body().read_to_string(&mut body) {
        if size > 0 {
            debug!(request_id = %request_id, body_size_bytes = size, "Request body read");
            if is_form(content_type.as_deref()) {
                builder = builder.params(parse_form(&body));
            } else if let Ok(json) = serde_json::from_str::<Value>(&body) {
                builder = builder.body(json);
            }
        }
    }

    for (name, value) in &headers {
        builder = builder.header(name, value.clone());
    }
    for (name, value) in &cookies {
        builder = builder.cookie(name, value.clone());
    }
    let request = builder.build();
    info!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.path(),
        "HTTP request parsed"
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_are_split_and_trimmed() {
        let cookies = parse_cookies("a=b; c = d ;flag");
        let pairs: Vec<(&str, &str)> = cookies.iter().map(|(k, v)| (k.as_ref(), v.as_str())).collect();
        assert_eq!(pairs, vec![("a", "b"), ("c", "d"), ("flag", "")]);
    }

    #[test]
    fn query_params_are_decoded() {
        let q = parse_query_params("/widgets?q=blue%20one&limit=10");
        assert_eq!(
            q,
            vec![
                ("q".to_string(), "blue one".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
        assert!(parse_query_params("/widgets").is_empty());
    }

    #[test]
    fn form_content_type_detection() {
        assert!(is_form(Some("application/x-www-form-urlencoded; charset=utf-8")));
        assert!(!is_form(Some("application/json")));
        assert!(!is_form(None));
    }
}
