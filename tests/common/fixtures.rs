//! Static access-log corpora used across harnesses.
//!
//! Lines are shaped like real Traefik JSON access-log output, including the
//! router/service metadata the normalizer is expected to ignore.

/// Valid lines, one per severity band plus a few header shapes.
pub const CORPUS_VALID: &[&str] = &[
    r#"{"ClientAddr":"10.0.0.7:51234","DownstreamStatus":200,"Duration":4500000,"RequestHost":"api.example.com","RequestMethod":"GET","RequestPath":"/v1/users","RequestProtocol":"HTTP/1.1","RequestScheme":"https","RouterName":"api@docker","StartUTC":"2025-03-01T12:00:00.123456789Z","level":"info","msg":"","request_User-Agent":"curl/8.5.0"}"#,
    r#"{"DownstreamStatus":302,"Duration":812000,"RequestHost":"example.com","RequestMethod":"GET","RequestPath":"/login","RequestProtocol":"HTTP/2.0","RequestScheme":"https","StartUTC":"2025-03-01T12:00:01Z","msg":"redirect"}"#,
    r#"{"DownstreamStatus":404,"Duration":999999,"RequestHost":"example.com","RequestMethod":"GET","RequestPath":"/favicon.ico","RequestProtocol":"HTTP/1.1","RequestScheme":"http","StartUTC":"2025-03-01T12:00:02Z","request_Accept":"image/*","request_Referer":"https://example.com/"}"#,
    r#"{"DownstreamStatus":503,"Duration":30000000000,"RequestHost":"api.example.com","RequestMethod":"POST","RequestPath":"/v1/payments","RequestProtocol":"HTTP/1.1","RequestScheme":"https","ServiceURL":"http://10.0.1.4:8080","StartUTC":"2025-03-01T12:00:03Z","msg":"upstream timeout","request_X-Request-Id":"req-abc123"}"#,
];

/// Lines the normalizer must reject, each for a different reason.
pub const CORPUS_INVALID: &[&str] = &[
    "not json at all",
    r#"{"DownstreamStatus":200"#,
    r#"["an","array"]"#,
    r#"{"DownstreamStatus":200,"Duration":1,"RequestHost":"h","RequestMethod":"GET","RequestProtocol":"HTTP/1.1","RequestScheme":"http","StartUTC":"2025-03-01T12:00:00Z"}"#,
    r#"{"DownstreamStatus":"200","Duration":1,"RequestHost":"h","RequestMethod":"GET","RequestPath":"/","RequestProtocol":"HTTP/1.1","RequestScheme":"http","StartUTC":"2025-03-01T12:00:00Z"}"#,
];

/// Generate `n` valid lines with distinct paths (`/item/0`, `/item/1`, …) and
/// statuses cycling through the three severity bands.
pub fn corpus_high_volume(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let status = match i % 10 {
                0 => 500,
                1 | 2 => 404,
                _ => 200,
            };
            super::builders::RawLine::new()
                .path(&format!("/item/{i}"))
                .status(status)
                .duration_ns((i as u64 % 50) * 1_000_000)
                .header("X-Seq", &i.to_string())
                .build()
        })
        .collect()
}
