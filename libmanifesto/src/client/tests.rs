use super::*;
use mockito::Matcher;

fn challenge_for(server: &mockito::Server, scope: &str) -> String {
    format!(
        r#"Bearer realm="{}/token",service="reg",scope="{}""#,
        server.url(),
        scope
    )
}

#[test]
fn test_client_new_with_valid_url() {
    let client = Client::new("http://localhost:5000", None);
    assert!(client.is_ok());
}

#[test]
fn test_client_defaults_to_https_without_scheme() {
    let client = Client::new("quay.io", None).unwrap();
    assert_eq!(client.registry_url(), "https://quay.io");
}

#[test]
fn test_client_insecure_uses_http_without_scheme() {
    let config = ClientConfig::new().with_insecure(true);
    let client = Client::with_config("localhost:5000", config, None).unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn test_client_removes_trailing_slashes() {
    let client = Client::new("http://localhost:5000///", None).unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn test_client_new_with_empty_url_fails() {
    let client = Client::new("   ", None);
    assert!(matches!(
        client.unwrap_err(),
        ManifestoError::Validation { .. }
    ));
}

#[test]
fn test_client_config_default() {
    let config = ClientConfig::new();
    assert_eq!(config.timeout_seconds, 10);
    assert!(!config.insecure);
}

#[test]
fn test_client_initial_auth_state() {
    let anonymous = Client::new("http://localhost:5000", None).unwrap();
    assert_eq!(anonymous.auth_state(), &AuthState::NoAuth);

    let basic = Client::new(
        "http://localhost:5000",
        Some(Credentials::basic("user", "pass")),
    )
    .unwrap();
    assert_eq!(basic.auth_state(), &AuthState::Basic);
}

#[test]
fn test_resolve_url_variants() {
    let client = Client::new("http://localhost:5000", None).unwrap();

    assert_eq!(
        client.resolve_url("/v2/acme/blobs/uploads/").unwrap().as_str(),
        "http://localhost:5000/v2/acme/blobs/uploads/"
    );
    assert_eq!(
        client
            .resolve_url("https://storage.example/upload?x=1")
            .unwrap()
            .as_str(),
        "https://storage.example/upload?x=1"
    );
    assert_eq!(
        client.resolve_url("v2/acme/blobs/uploads/abc").unwrap().as_str(),
        "http://localhost:5000/v2/acme/blobs/uploads/abc"
    );
}

#[test]
fn test_get_sends_user_agent_and_returns_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v2/")
        .match_header("user-agent", CLIENT_USER_AGENT)
        .with_status(200)
        .with_header("Docker-Distribution-API-Version", "registry/2.0")
        .with_body("{}")
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let response = client.get("/v2/").unwrap();

    mock.assert();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.header("Docker-Distribution-API-Version"),
        Some("registry/2.0")
    );
    assert_eq!(response.body(), b"{}");
}

#[test]
fn test_server_error_is_returned_not_retried() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v2/")
        .with_status(503)
        .with_body("unavailable")
        .expect(1)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let response = client.get("/v2/").unwrap();

    mock.assert();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.into_body(), b"unavailable".to_vec());
}

#[test]
fn test_connection_failure_is_transport_error() {
    // Nothing listens on the discard port.
    let mut client = Client::new("http://127.0.0.1:9", None).unwrap();
    let result = client.get("/v2/");
    assert!(matches!(result, Err(ManifestoError::Transport { .. })));
}

#[test]
fn test_basic_credentials_sent_unconditionally() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v2/")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .create();

    let mut client =
        Client::new(&server.url(), Some(Credentials::basic("user", "pass"))).unwrap();
    let response = client.get("/v2/").unwrap();

    mock.assert();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.auth_state(), &AuthState::Basic);
}

#[test]
fn test_bearer_flow_fetches_one_token_then_reuses_it() {
    let mut server = mockito::Server::new();
    let scope = "repository:acme/widget:pull";

    let challenged = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, scope))
        .expect(1)
        .create();
    let token_endpoint = server
        .mock("GET", "/token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("service".into(), "reg".into()),
            Matcher::UrlEncoded("scope".into(), scope.into()),
        ]))
        .with_status(200)
        .with_body(r#"{"token":"tok-1"}"#)
        .expect(1)
        .create();
    let authorized = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body("blob")
        .expect(2)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();

    let first = client.get("/v2/acme/widget/blobs/sha256:abc").unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        client.auth_state(),
        &AuthState::BearerCached {
            scope: scope.to_string()
        }
    );

    // The cached token goes out on the first attempt: no challenge, no token fetch.
    let second = client.get("/v2/acme/widget/blobs/sha256:abc").unwrap();
    assert_eq!(second.body(), b"blob");

    challenged.assert();
    token_endpoint.assert();
    authorized.assert();
}

#[test]
fn test_token_request_uses_basic_credentials() {
    let mut server = mockito::Server::new();
    let scope = "repository:acme/widget:pull,push";

    let _challenged = server
        .mock("POST", "/v2/acme/widget/blobs/uploads/")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, scope))
        .create();
    let token_endpoint = server
        .mock("GET", "/token")
        .match_query(Matcher::Any)
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .with_body(r#"{"token":"push-token"}"#)
        .expect(1)
        .create();
    let accepted = server
        .mock("POST", "/v2/acme/widget/blobs/uploads/")
        .match_header("authorization", "Bearer push-token")
        .with_status(202)
        .create();

    let mut client =
        Client::new(&server.url(), Some(Credentials::basic("user", "pass"))).unwrap();
    let response = client
        .call(Method::POST, "/v2/acme/widget/blobs/uploads/", &[], "")
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    token_endpoint.assert();
    accepted.assert();
}

#[test]
fn test_cached_token_for_challenge_scope_is_retried_first() {
    let mut server = mockito::Server::new();
    let pull = "repository:acme/widget:pull";
    let push = "repository:acme/widget:pull,push";

    // Acquire a push token first.
    let _push_challenge = server
        .mock("POST", "/v2/acme/widget/blobs/uploads/")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, push))
        .create();
    let _push_token = server
        .mock("GET", "/token")
        .match_query(Matcher::UrlEncoded("scope".into(), push.into()))
        .with_status(200)
        .with_body(r#"{"token":"push-token"}"#)
        .expect(1)
        .create();
    let _push_ok = server
        .mock("POST", "/v2/acme/widget/blobs/uploads/")
        .match_header("authorization", "Bearer push-token")
        .with_status(202)
        .create();

    // Then a pull token.
    let _pull_challenge = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .match_header("authorization", "Bearer push-token")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, pull))
        .create();
    let _pull_token = server
        .mock("GET", "/token")
        .match_query(Matcher::UrlEncoded("scope".into(), pull.into()))
        .with_status(200)
        .with_body(r#"{"token":"pull-token"}"#)
        .expect(1)
        .create();
    let _pull_ok = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .match_header("authorization", "Bearer pull-token")
        .with_status(200)
        .create();

    // Going back to push with the pull token in use: the cached push token
    // answers the challenge without another token request.
    let push_challenge_again = server
        .mock("POST", "/v2/acme/widget/blobs/uploads/")
        .match_header("authorization", "Bearer pull-token")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, push))
        .expect(1)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let upload_path = "/v2/acme/widget/blobs/uploads/";

    assert_eq!(
        client.call(Method::POST, upload_path, &[], "").unwrap().status(),
        StatusCode::ACCEPTED
    );
    assert_eq!(
        client.get("/v2/acme/widget/blobs/sha256:abc").unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        client.call(Method::POST, upload_path, &[], "").unwrap().status(),
        StatusCode::ACCEPTED
    );

    push_challenge_again.assert();
    assert_eq!(
        client.auth_state(),
        &AuthState::BearerCached {
            scope: push.to_string()
        }
    );
}

#[test]
fn test_final_retry_result_is_returned_as_is() {
    let mut server = mockito::Server::new();
    let scope = "repository:acme/widget:pull";

    let blob = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, scope))
        .expect(2)
        .create();
    let token_endpoint = server
        .mock("GET", "/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"token":"rejected"}"#)
        .expect(1)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let response = client.get("/v2/acme/widget/blobs/sha256:abc").unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    blob.assert();
    token_endpoint.assert();
}

#[test]
fn test_rejected_cached_token_is_not_resent_before_refresh() {
    let mut server = mockito::Server::new();
    let scope = "repository:acme/widget:pull";

    let _anonymous = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, scope))
        .create();
    let _accepted = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .create();
    let revoked = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:def")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, scope))
        .expect(2)
        .create();
    let token_endpoint = server
        .mock("GET", "/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"token":"tok"}"#)
        .expect(2)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    client.get("/v2/acme/widget/blobs/sha256:abc").unwrap();

    // First attempt carries the cached token; the identical retry is skipped
    // and the final attempt uses a freshly fetched token.
    let response = client.get("/v2/acme/widget/blobs/sha256:def").unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    revoked.assert();
    token_endpoint.assert();
}

#[test]
fn test_token_endpoint_failure_is_auth_token_error() {
    let mut server = mockito::Server::new();
    let scope = "repository:acme/widget:pull";

    let _blob = server
        .mock("GET", "/v2/acme/widget/blobs/sha256:abc")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge_for(&server, scope))
        .expect(1)
        .create();
    let _token_endpoint = server
        .mock("GET", "/token")
        .match_query(Matcher::Any)
        .with_status(403)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let result = client.get("/v2/acme/widget/blobs/sha256:abc");

    assert!(matches!(result, Err(ManifestoError::AuthToken { .. })));
    assert_eq!(client.auth_state(), &AuthState::NoAuth);
}

#[test]
fn test_malformed_token_body_is_auth_token_error() {
    let mut server = mockito::Server::new();

    let _blob = server
        .mock("GET", "/v2/")
        .with_status(401)
        .with_header(
            "WWW-Authenticate",
            &challenge_for(&server, "registry:catalog:*"),
        )
        .create();
    let _token_endpoint = server
        .mock("GET", "/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>login</html>")
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let result = client.get("/v2/");

    assert!(matches!(result, Err(ManifestoError::AuthToken { .. })));
}

#[test]
fn test_malformed_challenge_is_parse_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/v2/")
        .with_status(401)
        .with_header("WWW-Authenticate", "Bearer service=\"reg\"")
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let result = client.get("/v2/");

    assert!(matches!(
        result,
        Err(ManifestoError::AuthChallengeParse { .. })
    ));
    assert_eq!(client.auth_state(), &AuthState::NoAuth);
}

#[test]
fn test_missing_challenge_header_is_parse_error() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/v2/").with_status(401).create();

    let mut client = Client::new(&server.url(), None).unwrap();
    assert!(matches!(
        client.get("/v2/"),
        Err(ManifestoError::AuthChallengeParse { .. })
    ));
}

#[test]
fn test_basic_challenge_is_returned_without_token_request() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v2/")
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Basic realm="secure""#)
        .expect(1)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let response = client.get("/v2/").unwrap();

    mock.assert();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_content_type_and_body_are_sent() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PUT", "/upload")
        .match_header("content-type", "application/octet-stream")
        .match_body("payload")
        .with_status(201)
        .create();

    let mut client = Client::new(&server.url(), None).unwrap();
    let response = client
        .call(Method::PUT, "/upload", b"payload", "application/octet-stream")
        .unwrap();

    mock.assert();
    assert_eq!(response.status(), StatusCode::CREATED);
}
