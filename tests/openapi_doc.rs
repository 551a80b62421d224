//! Integration checks for the generated OpenAPI document.

use utoipa::OpenApi;

use skyvidya_eval_lib::api::ApiDoc;

#[test]
fn openapi_document_serializes() {
    let doc = ApiDoc::openapi();
    let json = doc.to_json().expect("OpenAPI document must serialize");
    assert!(json.contains("Skyvidya Eval Server"));
}

#[test]
fn openapi_document_covers_core_endpoints() {
    let doc = ApiDoc::openapi();

    for path in [
        "/api/v1/health",
        "/api/v1/agents",
        "/api/v1/test-cases",
        "/api/v1/batches/dispatch",
        "/api/v1/batches/{id}/cancel",
        "/api/v1/validator/validate",
        "/api/v1/executions",
        "/api/v1/benchmarks",
        "/api/v1/reports/generate",
        "/api/v1/domains/{id}/verify",
        "/api/v1/auth/keys",
    ] {
        assert!(
            doc.paths.paths.contains_key(path),
            "OpenAPI document is missing {}",
            path
        );
    }
}

#[test]
fn openapi_document_declares_api_key_scheme() {
    let doc = ApiDoc::openapi();
    let components = doc.components.expect("components present");
    assert!(components.security_schemes.contains_key("api_key"));
}
