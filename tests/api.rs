use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use tempfile::TempDir;

use flat_twitter::config::StorageConfig;
use flat_twitter::{handlers, AppState, Store};

async fn state_in(dir: &TempDir) -> web::Data<AppState> {
    let storage = StorageConfig {
        users_path: dir.path().join("users.json"),
        tweets_path: dir.path().join("tweets.json"),
    };
    web::Data::new(AppState {
        store: Store::open(&storage).await.unwrap(),
        bcrypt_cost: 4,
    })
}

fn register_body() -> Value {
    json!({
        "user_id": "11111111-1111-1111-1111-111111111111",
        "email": "a@b.com",
        "first_name": "A",
        "last_name": "B",
        "password": "password1",
    })
}

fn tweet_body(tweet_id: &str, content: &str) -> Value {
    json!({
        "tweet_id": tweet_id,
        "content": content,
        "by": {
            "user_id": "11111111-1111-1111-1111-111111111111",
            "email": "a@b.com",
            "first_name": "A",
            "last_name": "B",
            "birthday": "2000-01-31",
        },
    })
}

#[actix_web::test]
async fn signup_returns_user_without_password() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir).await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(register_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], "11111111-1111-1111-1111-111111111111");
    assert_eq!(body["email"], "a@b.com");
    assert_eq!(body["first_name"], "A");
    assert_eq!(body["last_name"], "B");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let req = test::TestRequest::get().uri("/users").to_request();
    let users: Value = test::call_and_read_body_json(&app, req).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "a@b.com");
    assert!(users[0].get("password").is_none());
    assert!(users[0].get("password_hash").is_none());

    let stored = state.store.users.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0].password_hash, "password1");
    assert!(bcrypt::verify("password1", &stored[0].password_hash).unwrap());
}

#[actix_web::test]
async fn signup_rejects_duplicate_user_id() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let req = test::TestRequest::post()
            .uri("/signup")
            .set_json(register_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }

    let req = test::TestRequest::get().uri("/users").to_request();
    let users: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn signup_reports_each_invalid_field() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let mut body = register_body();
    body["email"] = json!("nope");
    body["last_name"] = json!("");
    body["password"] = json!("short");
    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    let fields = body["fields"].as_object().unwrap();
    let mut names: Vec<&str> = fields.keys().map(String::as_str).collect();
    names.sort();
    assert_eq!(names, vec!["email", "last_name", "password"]);
}

#[actix_web::test]
async fn users_empty_before_signup() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/users").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn oversized_tweet_is_rejected_and_not_stored() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(tweet_body(
            "22222222-2222-2222-2222-222222222222",
            &"x".repeat(257),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["content"].is_array());

    let req = test::TestRequest::get().uri("/").to_request();
    let tweets: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tweets, json!([]));
}

#[actix_web::test]
async fn tweets_listed_in_post_order() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let first = "22222222-2222-2222-2222-222222222222";
    let second = "33333333-3333-3333-3333-333333333333";
    for (id, content) in [(first, "x".repeat(256)), (second, "hello".to_string())] {
        let req = test::TestRequest::post()
            .uri("/post")
            .set_json(tweet_body(id, &content))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["tweet_id"], id);
        assert!(body["created_at"].is_string());
        assert_eq!(body["updated_at"], Value::Null);
    }

    let req = test::TestRequest::get().uri("/").to_request();
    let tweets: Value = test::call_and_read_body_json(&app, req).await;
    let tweets = tweets.as_array().unwrap();
    assert_eq!(tweets.len(), 2);
    assert_eq!(tweets[0]["tweet_id"], first);
    assert_eq!(tweets[1]["tweet_id"], second);
    assert_eq!(tweets[1]["by"]["birthday"], "2000-01-31");
}

#[actix_web::test]
async fn tweet_with_invalid_author_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let mut body = tweet_body("22222222-2222-2222-2222-222222222222", "hi");
    body["by"]["email"] = json!("not-an-email");
    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["by.email"].is_array());
}

#[actix_web::test]
async fn malformed_body_is_a_validation_error() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(tweet_body("not-a-uuid", "hi"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["tweet_id"].is_array());

    let req = test::TestRequest::post()
        .uri("/post")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"tweet_id\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["body"].is_array());
}

#[actix_web::test]
async fn naive_created_at_is_accepted_as_utc() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let mut body = tweet_body("22222222-2222-2222-2222-222222222222", "hi");
    body["created_at"] = json!("2024-01-01T12:00:00");
    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["created_at"], "2024-01-01T12:00:00Z");
}

#[actix_web::test]
async fn last_name_length_limits() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let mut body = register_body();
    body["last_name"] = json!("n".repeat(51));
    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["last_name"].is_array());

    let mut body = register_body();
    body["last_name"] = json!("n".repeat(50));
    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn openapi_document_lists_tagged_routes() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/openapi.json").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = test::read_body_json(resp).await;

    assert_eq!(doc["paths"]["/signup"]["post"]["tags"][0], "Users");
    assert_eq!(doc["paths"]["/signup"]["post"]["summary"], "Register a user");
    assert_eq!(doc["paths"]["/"]["get"]["tags"][0], "Tweets");
    assert_eq!(doc["paths"].as_object().unwrap().len(), 11);
    assert!(doc["paths"]["/get/{tweet_id}/delete"]["delete"].is_object());
    assert!(doc["components"]["schemas"]["User"].is_object());
    assert!(doc["components"]["schemas"]["Tweet"].is_object());
    assert!(doc["components"]["schemas"]["UserRegister"]["properties"]["password"].is_object());
}

#[actix_web::test]
async fn placeholder_routes_are_not_implemented() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_in(&dir).await)
            .configure(handlers::configure),
    )
    .await;

    let id = "11111111-1111-1111-1111-111111111111";
    let requests = vec![
        test::TestRequest::post().uri("/login"),
        test::TestRequest::get().uri(&format!("/users/{}", id)),
        test::TestRequest::delete().uri(&format!("/users/{}/delete", id)),
        test::TestRequest::put().uri(&format!("/users/{}/update", id)),
        test::TestRequest::get().uri(&format!("/get/{}", id)),
        test::TestRequest::delete().uri(&format!("/get/{}/delete", id)),
        test::TestRequest::put().uri(&format!("/get/{}/update", id)),
    ];
    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
    }

    let req = test::TestRequest::get().uri("/get/12345").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn corrupt_collection_hides_details() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir).await;
    std::fs::write(dir.path().join("users.json"), "[{\"user_id\": 42}]").unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/users").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "internal server error" }));
}
