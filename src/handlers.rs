use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use bcrypt::hash;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use utoipa::OpenApi;
use uuid::Uuid;
use validator::Validate;

use crate::db::Store;
use crate::error::{AppError, AppResult, ErrorBody, ValidationErrorBody};
use crate::models::{Tweet, User, UserBase, UserLogin, UserRecord, UserRegister};

pub struct AppState {
    pub store: Store,
    pub bcrypt_cost: u32,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        signup,
        login,
        get_users,
        get_user,
        delete_user,
        update_user,
        home,
        create_tweet,
        get_tweet,
        delete_tweet,
        update_tweet
    ),
    components(schemas(UserBase, UserLogin, ErrorBody, ValidationErrorBody)),
    tags(
        (name = "Users", description = "Registration and user listing"),
        (name = "Tweets", description = "Posting and reading tweets")
    )
)]
pub struct ApiDoc;

/// Registers every route plus the extractor configs that turn bad bodies and ids into 422s.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req: &HttpRequest| AppError::from(err).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req: &HttpRequest| AppError::from(err).into()),
    )
    .service(openapi_json)
    .service(signup)
    .service(login)
    .service(get_users)
    .service(get_user)
    .service(delete_user)
    .service(update_user)
    .service(home)
    .service(create_tweet)
    .service(get_tweet)
    .service(delete_tweet)
    .service(update_tweet);
}

/// Decodes a JSON body so a parse failure names its field, then applies the field constraints.
fn parse_body<T>(body: Value) -> AppResult<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_path_to_error::deserialize(body)?;
    parsed.validate()?;
    Ok(parsed)
}

#[get("/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

// Users

/// Register a user
///
/// Stores the user with a hashed password and returns it without the password.
#[utoipa::path(
    post,
    path = "/signup",
    tag = "Users",
    request_body = UserRegister,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 409, description = "user_id already registered", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ValidationErrorBody)
    )
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let register: UserRegister = parse_body(payload.into_inner())?;

    let (user, password) = register.into_parts();
    let cost = state.bcrypt_cost;
    let password_hash = web::block(move || hash(password, cost)).await??;

    let record = state
        .store
        .users
        .append(UserRecord {
            user,
            password_hash,
        })
        .await?;

    info!("User registered: {}", record.user.user_id);
    Ok(HttpResponse::Created().json(record.user))
}

/// Login a user
#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
#[post("/login")]
pub async fn login() -> AppResult<HttpResponse> {
    Err(AppError::NotImplemented("login"))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses((status = 200, description = "Users in registration order", body = [User]))
)]
#[get("/users")]
pub async fn get_users(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users: Vec<User> = state
        .store
        .users
        .list()
        .await?
        .into_iter()
        .map(|record| record.user)
        .collect();

    debug!("Listing {} users", users.len());
    Ok(HttpResponse::Ok().json(users))
}

/// Get specific user
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "Users",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
#[get("/users/{user_id}")]
pub async fn get_user(_user_id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Err(AppError::NotImplemented("get user"))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{user_id}/delete",
    tag = "Users",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
#[delete("/users/{user_id}/delete")]
pub async fn delete_user(_user_id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Err(AppError::NotImplemented("delete user"))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{user_id}/update",
    tag = "Users",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
#[put("/users/{user_id}/update")]
pub async fn update_user(_user_id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Err(AppError::NotImplemented("update user"))
}

// Tweets

/// Get all tweets
#[utoipa::path(
    get,
    path = "/",
    tag = "Tweets",
    responses((status = 200, description = "Tweets in posting order", body = [Tweet]))
)]
#[get("/")]
pub async fn home(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tweets = state.store.tweets.list().await?;
    debug!("Listing {} tweets", tweets.len());
    Ok(HttpResponse::Ok().json(tweets))
}

/// Create a tweet
///
/// The author is stored as a snapshot; `created_at` defaults to the time of the request.
#[utoipa::path(
    post,
    path = "/post",
    tag = "Tweets",
    request_body = Tweet,
    responses(
        (status = 201, description = "Tweet created", body = Tweet),
        (status = 409, description = "tweet_id already posted", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ValidationErrorBody)
    )
)]
#[post("/post")]
pub async fn create_tweet(
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let tweet: Tweet = parse_body(payload.into_inner())?;

    let tweet = state.store.tweets.append(tweet).await?;
    info!("Tweet created successfully: {}", tweet.tweet_id);
    Ok(HttpResponse::Created().json(tweet))
}

/// Get a tweet
#[utoipa::path(
    get,
    path = "/get/{tweet_id}",
    tag = "Tweets",
    params(("tweet_id" = Uuid, Path, description = "Tweet id")),
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
#[get("/get/{tweet_id}")]
pub async fn get_tweet(_tweet_id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Err(AppError::NotImplemented("get tweet"))
}

/// Delete a tweet
#[utoipa::path(
    delete,
    path = "/get/{tweet_id}/delete",
    tag = "Tweets",
    params(("tweet_id" = Uuid, Path, description = "Tweet id")),
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
#[delete("/get/{tweet_id}/delete")]
pub async fn delete_tweet(_tweet_id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Err(AppError::NotImplemented("delete tweet"))
}

/// Update a tweet
#[utoipa::path(
    put,
    path = "/get/{tweet_id}/update",
    tag = "Tweets",
    params(("tweet_id" = Uuid, Path, description = "Tweet id")),
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
#[put("/get/{tweet_id}/update")]
pub async fn update_tweet(_tweet_id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Err(AppError::NotImplemented("update tweet"))
}
