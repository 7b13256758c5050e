use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use config::{File, FileFormat};
use infra::config::AppConfigImpl;
use infra::repository::postgres::schema;
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use server::native_api::{configure_service, MediaItemDto, MonthlyPlaysDto, PerformerDto};
use server::AppState;

async fn app_state() -> web::Data<AppState> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    schema::create_tables(&db).await.unwrap();
    let cfg = AppConfigImpl::load_from(File::from_str("", FileFormat::Toml)).unwrap();
    web::Data::new(AppState::new(db, cfg).unwrap())
}

macro_rules! init_app {
    () => {
        test::init_service(App::new().app_data(app_state().await).configure(configure_service))
            .await
    };
}

#[actix_web::test]
async fn test_record_and_read_monthly_plays() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/performers")
        .set_json(json!({ "name": "Alice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let alice: PerformerDto = test::read_body_json(resp).await;
    assert_eq!(alice.name, "Alice");

    let req = test::TestRequest::post()
        .uri("/api/media-items")
        .set_json(json!({ "title": "Song A", "owner_id": alice.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let song: MediaItemDto = test::read_body_json(resp).await;
    assert_eq!(song.play_count, 0);

    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/plays")
            .set_json(json!({
                "media_item_id": song.id,
                "performer_id": alice.id,
                "month": 5,
                "year": 2024
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/plays?performer_id={}&month=5&year=2024", alice.id))
        .to_request();
    let plays: MonthlyPlaysDto = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        plays,
        MonthlyPlaysDto {
            performer_id: alice.id.clone(),
            month: 5,
            year: 2024,
            total_plays: Some(3),
        }
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/media-items?id={}", song.id))
        .to_request();
    let items: Vec<MediaItemDto> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].play_count, 3);
}

#[actix_web::test]
async fn test_unrecorded_month_reads_as_null() {
    let app = init_app!();

    let req = test::TestRequest::get()
        .uri("/api/plays?performer_id=1&month=1&year=2024")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["total_plays"].is_null());
    assert_eq!(body["performer_id"], "1");
}

#[actix_web::test]
async fn test_malformed_input_is_rejected() {
    let app = init_app!();

    for uri in [
        "/api/plays?performer_id=abc&month=5&year=2024",
        "/api/plays?performer_id=1&month=13&year=2024",
        "/api/plays?performer_id=1",
        "/api/performers?id=1,x",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 400, "{}", uri);
    }

    let req = test::TestRequest::post()
        .uri("/api/performers")
        .set_json(json!({ "name": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_play_of_unknown_item_is_internal_error() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/plays")
        .set_json(json!({
            "media_item_id": "404",
            "performer_id": "1",
            "month": 5,
            "year": 2024
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Internal Server Error");
}

#[actix_web::test]
async fn test_list_performers_with_cursor() {
    let app = init_app!();

    let mut created = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        let req = test::TestRequest::post()
            .uri("/api/performers")
            .set_json(json!({ "name": name }))
            .to_request();
        let performer: PerformerDto = test::call_and_read_body_json(&app, req).await;
        created.push(performer);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/performers?from_id={}", created[0].id))
        .to_request();
    let page: Vec<PerformerDto> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Carol"]);

    let req = test::TestRequest::get()
        .uri("/api/performers?name=Carol")
        .to_request();
    let page: Vec<PerformerDto> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page, vec![PerformerDto { id: created[2].id.clone(), name: "Carol".to_string() }]);
}

#[actix_web::test]
async fn test_health() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "status": "ok" }));
}
