//! End-to-end requests through the actix application.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use amp_lib::api::{
    configure_audit_routes, configure_case_routes, configure_health_routes,
    configure_sitemap_routes, configure_task_routes,
};
use amp_lib::config::USER_ID_HEADER;
use amp_lib::db::DbPool;
use amp_lib::services::storage::BlobStore;
use amp_lib::services::url_check::{PreviousCaseCheck, UrlChecker};
use amp_lib::services::MemoryBlobStore;
use serde_json::{Value, json};

use crate::test_helpers::*;

fn previous_case_check() -> PreviousCaseCheck {
    PreviousCaseCheck {
        checker: UrlChecker::new(1).expect("Failed to build HTTP client"),
        platform_domain: "amp.test".to_string(),
    }
}

macro_rules! test_app {
    ($pool:expr) => {{
        let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::from(store))
                .app_data(web::Data::new(previous_case_check()))
                .service(
                    web::scope("/api/v1")
                        .configure(configure_health_routes)
                        .configure(configure_case_routes)
                        .configure(configure_audit_routes)
                        .configure(configure_task_routes)
                        .configure(configure_sitemap_routes),
                ),
        )
        .await
    }};
}

fn new_case_body() -> Value {
    json!({
        "organisation_name": "Acme Council",
        "home_page_url": "https://www.acme.example/",
        "sector_id": null,
        "subcategory_id": null,
        "auditor_id": null
    })
}

#[actix_rt::test]
async fn test_health() {
    let pool: DbPool = create_test_pool().await;
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_writes_need_a_known_user() {
    let pool = create_test_pool().await;
    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/cases")
        .set_json(new_case_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/cases")
        .insert_header((USER_ID_HEADER, "999"))
        .set_json(new_case_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_create_and_update_case_over_http() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/cases")
        .insert_header((USER_ID_HEADER, user.id.to_string()))
        .set_json(new_case_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let case: Value = test::read_body_json(resp).await;
    assert_eq!(case["case_identifier"], "#S-1");
    assert_eq!(case["domain"], "acme.example");
    let case_id = case["id"].as_i64().unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!(
            "/api/v1/cases/{}?page_url=/cases/{}/edit-case-metadata/",
            case_id, case_id
        ))
        .insert_header((USER_ID_HEADER, user.id.to_string()))
        .set_json(json!({"version": 1, "fields": {"notes": "Referred by a complaint"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: Value = test::read_body_json(resp).await;
    assert_eq!(outcome["changed"], true);
    assert_eq!(outcome["instance"]["version"], 2);
    assert_eq!(
        outcome["next_page_url"],
        format!("/cases/{}/create-audit/", case_id)
    );

    // Same version again is stale.
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/cases/{}", case_id))
        .insert_header((USER_ID_HEADER, user.id.to_string()))
        .set_json(json!({"version": 1, "fields": {"notes": "Overwritten"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "STALE_VERSION");
}

#[actix_rt::test]
async fn test_invalid_case_is_rejected_with_field_errors() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/cases")
        .insert_header((USER_ID_HEADER, user.id.to_string()))
        .set_json(json!({
            "organisation_name": "Acme Council",
            "home_page_url": "not a url",
            "sector_id": null,
            "subcategory_id": null,
            "auditor_id": null
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["home_page_url"].is_array());
}

#[actix_rt::test]
async fn test_sitemap_for_case_page() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let app = test_app!(pool);

    let url = format!("/cases/{}/edit-case-metadata/", case.id);
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/sitemap?url={}", url))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let sitemap: Value = test::read_body_json(resp).await;
    assert_eq!(sitemap["current_url"], url);
    assert_eq!(
        sitemap["next_page_url"],
        format!("/cases/{}/create-audit/", case.id)
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/sitemap?url=/no/such/page/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
