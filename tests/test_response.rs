use beacon::http::response::{Body, FileStream, Response, ResponseBuilder, StatusCode};
use beacon::http::writer::encode_head;
use std::io::Write;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::PayloadTooLarge.as_u16(), 413);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::PayloadTooLarge.reason_phrase(),
        "Request Entity Too Large"
    );
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_response_builder_auto_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body("This is the body")
        .build();

    assert_eq!(response.header("Content-Length"), Some("16"));
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("content-length", "999")
        .body("test")
        .build();

    assert_eq!(response.headers.len(), 1);
    assert_eq!(response.header("Content-Length"), Some("999"));
}

#[test]
fn test_response_builder_header_replaces_same_name() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("X-Custom", "one")
        .header("x-custom", "two")
        .build();

    assert_eq!(response.header("X-Custom"), Some("two"));
    assert_eq!(response.headers.len(), 2); // X-Custom + Content-Length
}

#[test]
fn test_response_builder_keeps_header_order() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("B", "2")
        .header("A", "1")
        .body("x")
        .build();

    assert_eq!(
        encode_head(&response),
        b"HTTP/1.1 200 OK\r\nB: 2\r\nA: 1\r\nContent-Length: 1\r\n\r\n".to_vec()
    );
}

#[test]
fn test_response_ok_helper() {
    let response = Response::ok("pong");

    assert_eq!(response.status, StatusCode::Ok);
    assert!(matches!(&response.body, Body::Buffered(b) if &b[..] == b"pong"));
    assert_eq!(response.header("Content-Length"), Some("4"));
}

#[test]
fn test_error_descriptors_match_wire_format() {
    let cases = [
        (StatusCode::BadRequest, &b"HTTP/1.1 400 Bad Request\r\n\r\n"[..]),
        (
            StatusCode::PayloadTooLarge,
            &b"HTTP/1.1 413 Request Entity Too Large\r\n\r\n"[..],
        ),
        (
            StatusCode::NotFound,
            &b"HTTP/1.1 404 Not Found\r\nContent-Length: 13\r\n\r\n"[..],
        ),
        (
            StatusCode::InternalServerError,
            &b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n"[..],
        ),
    ];

    for (status, head) in cases {
        let response = Response::error(status);
        assert_eq!(response.status, status);
        assert_eq!(encode_head(&response), head.to_vec());
    }
}

#[test]
fn test_not_found_body() {
    let response = Response::not_found();
    assert!(matches!(&response.body, Body::Buffered(b) if &b[..] == b"404 Not Found"));
}

#[test]
fn test_file_response_announces_file_size() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&[7u8; 3000]).unwrap();

    let response = Response::file(FileStream::new(file, 3000));

    assert!(response.is_streaming());
    assert_eq!(response.body.len(), 3000);
    assert_eq!(response.header("Content-Length"), Some("3000"));
}
