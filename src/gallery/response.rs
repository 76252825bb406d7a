//! Writing replies to tiny_http requests.

use std::fs;

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::routes::{Body, Reply};
use crate::utils::mime::types::PLAIN;

pub fn respond(request: Request, reply: Reply) -> Result<()> {
    let head = is_head_request(&request);
    let status = reply.status;
    let content_type = reply.content_type;

    match reply.body {
        _ if head => send_head(request, status, content_type),
        Body::Bytes(body) => send_body(request, status, content_type, body),
        Body::File(path) => match fs::File::open(&path) {
            Ok(file) => {
                let response = with_headers(Response::from_file(file), status, content_type);
                request.respond(response)?;
                Ok(())
            }
            // Removed between lookup and open.
            Err(_) => send_body(request, 404, PLAIN, b"404 Not Found".to_vec()),
        },
    }
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = with_headers(Response::empty(StatusCode(status)), status, content_type);
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = with_headers(Response::from_data(body), status, content_type);
    request.respond(response)?;
    Ok(())
}

fn with_headers<R: std::io::Read>(
    response: Response<R>,
    status: u16,
    content_type: &'static str,
) -> Response<R> {
    let response = response
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-store"));
    if status == 405 {
        response.with_header(make_header("Allow", "GET, HEAD"))
    } else {
        response
    }
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
