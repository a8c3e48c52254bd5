//! Dashboard routes driven end to end against a mock API.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cartas_client::ApiClient;
use cartas_web::{AppState, WebConfig, build_router};

fn jwt(offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + offset_secs;
    encode(
        &Header::default(),
        &json!({ "sub": 1, "exp": exp }),
        &EncodingKey::from_secret(b"api-secret"),
    )
    .unwrap()
}

fn app(server: &MockServer) -> Router {
    let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let config = WebConfig {
        files_url: "http://files.local/fileupload/file/".into(),
        page_size: 10,
        cache_ttl: Duration::from_secs(60),
        secure_cookies: false,
    };
    build_router(Arc::new(AppState::new(api, config)))
}

async fn mock_profile(server: &MockServer, token: &str, rol: &str) {
    mock_user(server, token, 1, rol).await;
}

async fn mock_user(server: &MockServer, token: &str, id: i64, rol: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .and(header_is("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "nombre": "Ana",
            "email": "ana@example.com",
            "rol": { "id": 1, "nombre": rol },
            "areaResponsableId": 3
        })))
        .mount(server)
        .await;
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("cartas_session={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn page(data: serde_json::Value) -> serde_json::Value {
    let total = data.as_array().map(|a| a.len()).unwrap_or_default();
    json!({
        "data": data,
        "meta": { "total": total, "page": 1, "limit": 100, "last_page": 1 }
    })
}

async fn mock_get(server: &MockServer, at: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Select-box sources of the letter forms.
async fn mock_catalogs(server: &MockServer) {
    mock_get(server, "/responsible-area", page(json!([{ "id": 1, "nombre": "Legal" }]))).await;
    mock_get(server, "/sub-areas", page(json!([{ "id": 1, "nombre": "Contratos" }]))).await;
    mock_get(server, "/theme", page(json!([{ "id": 2, "nombre": "Reclamos" }]))).await;
    mock_get(server, "/company", page(json!([{ "id": 1, "nombre": "ACME" }]))).await;
    mock_get(server, "/receiver", page(json!([{ "id": 1, "nombre": "Gerencia" }]))).await;
}

/// Letter 5 answers letter 4 and was itself answered by emitted letter 6.
async fn mock_thread(server: &MockServer) {
    mock_get(
        server,
        "/cards/5",
        json!({
            "id": 5,
            "codigoRecibido": "CR-5",
            "asunto": "Reclamo por facturación",
            "estado": "Pendiente",
            "cartaAnterior": 4
        }),
    )
    .await;
    mock_get(
        server,
        "/cards/4",
        json!({ "id": 4, "codigoRecibido": "CR-4", "asunto": "Primer aviso", "estado": "Cerrado" }),
    )
    .await;
    mock_get(
        server,
        "/cards/emitidos",
        page(json!([
            { "id": 6, "codigoEnviado": "CE-6", "asunto": "Re: Reclamo", "emitido": true, "cartaAnterior": 5 },
            { "id": 9, "codigoEnviado": "CE-9", "asunto": "Otro hilo", "emitido": true, "cartaAnterior": 8 }
        ])),
    )
    .await;
    mock_catalogs(server).await;
}

fn post_form(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("cartas_session={token}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "cartas-test-boundary";

fn post_multipart(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    archivo: Option<(&str, &str)>,
) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some((file_name, content)) = archivo {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"archivo\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("cartas_session={token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn location(res: &axum::response::Response) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let server = MockServer::start().await;
    let res = app(&server).oneshot(get("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_page_renders() {
    let server = MockServer::start().await;
    let res = app(&server).oneshot(get("/login", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("name=\"password\""));
}

#[tokio::test]
async fn protected_page_without_cookie_redirects_to_login() {
    let server = MockServer::start().await;
    let res = app(&server).oneshot(get("/cartas", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn expired_cookie_is_cleared() {
    let server = MockServer::start().await;
    let res = app(&server)
        .oneshot(get("/", Some(&jwt(-60))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    let cleared = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.to_str().unwrap_or_default().starts_with("cartas_session="));
    assert!(cleared);
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": token })))
        .expect(1)
        .mount(&server)
        .await;
    mock_profile(&server, &token, "Analista").await;

    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=ana%40example.com&password=secreto"))
        .unwrap();
    let res = app(&server).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with(&format!("cartas_session={token}")));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn rejected_login_shows_alert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized" })))
        .mount(&server)
        .await;

    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=ana%40example.com&password=mal"))
        .unwrap();
    let res = app(&server).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(res).await.contains("Correo o contraseña incorrectos"));
}

#[tokio::test]
async fn catalogs_are_admin_only() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;

    let res = app(&server)
        .oneshot(get("/admin/areas", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_sees_catalog_rows() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Administrador").await;
    Mock::given(method("GET"))
        .and(path("/responsible-area"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 1, "nombre": "Legal" }],
            "meta": { "total": 1, "page": 1, "limit": 10, "last_page": 1 }
        })))
        .mount(&server)
        .await;

    let res = app(&server)
        .oneshot(get("/admin/areas", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Legal"));
    assert!(html.contains("/admin/areas/1/editar"));
}

#[tokio::test]
async fn received_letters_are_listed_with_badges() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    Mock::given(method("GET"))
        .and(path("/cards/received"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 9,
                "codigoRecibido": "CR-2024-009",
                "asunto": "Solicitud de información",
                "estado": "Ingresado",
                "vencimiento": "2000-01-01T12:00:00Z"
            }],
            "meta": { "total": 1, "page": 1, "limit": 10, "last_page": 1 }
        })))
        .mount(&server)
        .await;

    let res = app(&server)
        .oneshot(get("/cartas/recibidas", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("CR-2024-009"));
    assert!(html.contains("badge bg-blue-100 text-blue-800"));
    assert!(html.contains("Fuera de plazo"));
}

#[tokio::test]
async fn api_rejection_of_token_logs_out() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized" })))
        .mount(&server)
        .await;

    let res = app(&server)
        .oneshot(get("/cartas", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn file_links_redirect_to_storage() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;

    let res = app(&server)
        .oneshot(get("/archivos/abc123.pdf", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "http://files.local/fileupload/file/abc123.pdf");
}

#[tokio::test]
async fn file_route_refuses_foreign_urls() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;

    let res = app(&server)
        .oneshot(get("/archivos/https://evil.example/phish", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().get(header::LOCATION).is_none());
}

#[tokio::test]
async fn cached_lists_are_not_shared_between_users() {
    let server = MockServer::start().await;
    let (ana, luis) = (jwt(3600), jwt(7200));
    mock_user(&server, &ana, 1, "Analista").await;
    mock_user(&server, &luis, 2, "Analista").await;
    for (token, asunto) in [(&ana, "CONFIDENCIAL-DE-ANA"), (&luis, "VISIBLE-PARA-LUIS")] {
        Mock::given(method("GET"))
            .and(path("/cards"))
            .and(header_is("authorization", format!("Bearer {token}").as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(json!([{ "id": 1, "asunto": asunto }]))),
            )
            .mount(&server)
            .await;
    }

    let app = app(&server);
    let first = app.clone().oneshot(get("/cartas", Some(&ana))).await.unwrap();
    assert!(body_text(first).await.contains("CONFIDENCIAL-DE-ANA"));

    let second = app.oneshot(get("/cartas", Some(&luis))).await.unwrap();
    let html = body_text(second).await;
    assert!(html.contains("VISIBLE-PARA-LUIS"));
    assert!(!html.contains("CONFIDENCIAL-DE-ANA"));
}

#[tokio::test]
async fn dashboard_counts_statuses_and_lists_overdue_letters() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    mock_get(
        &server,
        "/cards/pending/3",
        page(json!([
            { "id": 1, "codigoRecibido": "CR-VIEJA", "estado": "Pendiente", "vencimiento": "2000-01-01T12:00:00Z" },
            { "id": 2, "codigoRecibido": "CR-NUEVA", "estado": "PendienteArea", "vencimiento": "2999-01-01T12:00:00Z" }
        ])),
    )
    .await;
    mock_get(
        &server,
        "/cards/received",
        json!({ "data": [], "meta": { "total": 12, "page": 1, "limit": 1, "last_page": 12 } }),
    )
    .await;

    let res = app(&server).oneshot(get("/", Some(&token))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("<span>Recibidas</span><strong>12</strong>"));
    assert!(html.contains("<span>Fuera de plazo</span><strong>1</strong>"));
    assert!(html.contains(">Pendiente</span><strong>1</strong>"));
    assert!(html.contains(">Pendiente de área</span><strong>1</strong>"));
    assert!(html.contains("CR-VIEJA"));
    assert!(!html.contains("CR-NUEVA"));
}

#[tokio::test]
async fn new_letter_uploads_the_pdf_then_registers_it() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    Mock::given(method("POST"))
        .and(path("/fileupload/file"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "secureUrl": "http://files.local/fileupload/file/guardado-10.pdf",
            "fileName": "guardado-10.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cards"))
        .and(body_partial_json(json!({
            "codigoRecibido": "CR-10",
            "empresaId": 1,
            "pdfInfo": "guardado-10.pdf"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": 10, "codigoRecibido": "CR-10", "asunto": "Consulta" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let req = post_multipart(
        "/cartas/nueva",
        &token,
        &[("codigoRecibido", "CR-10"), ("asunto", "Consulta"), ("empresaId", "1")],
        Some(("carta.pdf", "%PDF-1.4")),
    );
    let res = app(&server).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/cartas/10?msg=Carta%20CR-10%20registrada");
}

#[tokio::test]
async fn new_letter_without_pdf_is_rerendered() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    mock_catalogs(&server).await;
    Mock::given(method("POST"))
        .and(path("/fileupload/file"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let req = post_multipart(
        "/cartas/nueva",
        &token,
        &[("codigoRecibido", "CR-11"), ("asunto", ""), ("empresaId", "1")],
        None,
    );
    let res = app(&server).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Adjunte el PDF de la carta"));
    assert!(html.contains("Campo obligatorio"));
    assert!(html.contains("CR-11"));
}

#[tokio::test]
async fn detail_page_shows_the_thread() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    mock_thread(&server).await;

    let res = app(&server).oneshot(get("/cartas/5", Some(&token))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    let (anterior, actual, respuesta) = (
        html.find("/cartas/4\"").unwrap(),
        html.find("/cartas/5\"").unwrap(),
        html.find("/cartas/6\"").unwrap(),
    );
    assert!(anterior < actual && actual < respuesta);
    assert!(!html.contains("CE-9"));
    assert!(html.contains("badge bg-yellow-100 text-yellow-800"));
    assert!(html.contains("/cartas/5/asignar"));
    assert!(html.contains("Re: Reclamo por facturación"));
}

#[tokio::test]
async fn assignment_with_missing_fields_is_rerendered() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    mock_thread(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/cards/assignment/5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let res = app(&server)
        .oneshot(post_form("/cartas/5/asignar", &token, "areaResponsableId=&temaId="))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("Campo obligatorio"));
}

#[tokio::test]
async fn assignment_rejected_by_the_api_shows_its_message() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    mock_thread(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/cards/assignment/5"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "La carta ya fue asignada" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let res = app(&server)
        .oneshot(post_form("/cartas/5/asignar", &token, "areaResponsableId=1&temaId=2"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains(r#"<div class="alert alert-error">La carta ya fue asignada</div>"#));
}

#[tokio::test]
async fn answer_is_uploaded_and_emitted() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    Mock::given(method("POST"))
        .and(path("/fileupload/file"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "secureUrl": "http://files.local/fileupload/file/respuesta-7.pdf",
            "fileName": "respuesta-7.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cards"))
        .and(body_partial_json(json!({
            "asunto": "Re: Reclamo",
            "pdfInfo": "respuesta-7.pdf",
            "cartaAnterior": 5,
            "emitido": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7,
            "codigoEnviado": "CE-7",
            "emitido": true,
            "cartaAnterior": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = post_multipart(
        "/cartas/5/responder",
        &token,
        &[("asunto", "Re: Reclamo")],
        Some(("respuesta.pdf", "%PDF-1.4")),
    );
    let res = app(&server).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/cartas/5?msg=Respuesta%20CE-7%20emitida");
}

#[tokio::test]
async fn closing_patches_the_status() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    Mock::given(method("PATCH"))
        .and(path("/cards/5"))
        .and(body_partial_json(json!({ "estado": "Cerrado" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "estado": "Cerrado" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let res = app(&server)
        .oneshot(post_form("/cartas/5/cerrar", &token, ""))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/cartas/5?msg=Carta%20cerrada");
}

#[tokio::test]
async fn login_shows_the_api_reason_when_it_has_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "message": "Usuario inactivo" })),
        )
        .mount(&server)
        .await;

    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=ana%40example.com&password=secreto"))
        .unwrap();
    let res = app(&server).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Usuario inactivo"));
    assert!(!html.contains("Correo o contraseña incorrectos"));
}

#[tokio::test]
async fn detail_rerenders_reuse_the_emitted_list() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mock_profile(&server, &token, "Analista").await;
    mock_thread(&server).await;

    let app = app(&server);
    let first = app.clone().oneshot(get("/cartas/5", Some(&token))).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let retry = app
        .oneshot(post_form("/cartas/5/asignar", &token, "areaResponsableId=&temaId="))
        .await
        .unwrap();
    assert_eq!(retry.status(), StatusCode::OK);

    let emitted_fetches = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/cards/emitidos")
        .count();
    assert_eq!(emitted_fetches, 1);
}
