use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const CATEGORIES: [&str; 8] = [
    "tech",
    "healthcare",
    "finance",
    "education",
    "retail",
    "food",
    "sustainability",
    "other",
];
const STATUSES: [&str; 3] = ["draft", "published", "archived"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(rename = "ANumber")]
    pub a_number: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Post {
    #[serde(rename = "PostID")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub target_market: Option<String>,
    pub business_model: Option<String>,
    pub funding_needs: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: User,
}

#[derive(Serialize, Deserialize)]
pub struct AuthBody {
    pub user: User,
    pub token: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "ANumber")]
    pub a_number: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PostInput {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub target_market: Option<String>,
    pub business_model: Option<String>,
    /// Accepts a JSON number or a decimal string.
    pub funding_needs: Option<Value>,
    pub status: Option<String>,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: Vec<Account>,
    tokens: HashMap<String, i64>,
    posts: BTreeMap<i64, Post>,
    next_user_id: i64,
    next_post_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/auth/register/", post(register))
        .route("/auth/login/", post(login))
        .route("/auth/user/", get(current_user))
        .route("/posts/", get(list_published).post(create_post))
        .route("/posts/published/", get(list_published))
        .route("/posts/my_posts/", get(my_posts))
        .route("/posts/{id}/", get(get_post).put(update_post).delete(delete_post))
        .route("/posts/{id}/publish/", post(publish_post))
        .route("/health/", get(health))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn failure(status: StatusCode, key: &str, message: &str) -> Failure {
    let mut body = Map::new();
    body.insert(key.to_string(), Value::String(message.to_string()));
    (status, Json(Value::Object(body)))
}

fn field_errors(errors: BTreeMap<&str, String>) -> Failure {
    let body = errors
        .into_iter()
        .map(|(field, message)| (field.to_string(), Value::from(vec![message])))
        .collect();
    (StatusCode::BAD_REQUEST, Json(Value::Object(body)))
}

fn not_found() -> Failure {
    failure(StatusCode::NOT_FOUND, "detail", "Not found.")
}

/// Resolve `Authorization: Token <key>` to a user id.
fn authenticate(store: &Store, headers: &HeaderMap) -> Result<i64, Failure> {
    let key = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Token "))
        .ok_or_else(|| {
            tracing::debug!("request without token");
            failure(
                StatusCode::UNAUTHORIZED,
                "detail",
                "Authentication credentials were not provided.",
            )
        })?;
    store
        .tokens
        .get(key.trim())
        .copied()
        .ok_or_else(|| {
            tracing::debug!("unknown token");
            failure(StatusCode::UNAUTHORIZED, "detail", "Invalid token.")
        })
}

impl Store {
    fn user(&self, id: i64) -> Option<&User> {
        self.accounts
            .iter()
            .find(|account| account.user.id == id)
            .map(|account| &account.user)
    }

    fn token_for(&mut self, user_id: i64) -> String {
        if let Some((key, _)) = self.tokens.iter().find(|(_, id)| **id == user_id) {
            return key.clone();
        }
        let key = Uuid::new_v4().simple().to_string();
        self.tokens.insert(key.clone(), user_id);
        key
    }

    fn own_post_mut(&mut self, id: i64, user_id: i64) -> Result<&mut Post, Failure> {
        self.posts
            .get_mut(&id)
            .filter(|post| post.author.id == user_id)
            .ok_or_else(not_found)
    }

    fn newest_first(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.values().filter(|p| keep(p)).cloned().collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        posts
    }
}

async fn register(State(db): State<Db>, Json(input): Json<RegisterInput>) -> Result<Response, Failure> {
    let mut store = db.write().await;

    let mut errors = BTreeMap::new();
    for (field, value) in [
        ("username", &input.username),
        ("email", &input.email),
        ("password", &input.password),
        ("ANumber", &input.a_number),
        ("first_name", &input.first_name),
        ("last_name", &input.last_name),
    ] {
        if value.trim().is_empty() {
            errors.insert(field, "This field is required.".to_string());
        }
    }
    if store.accounts.iter().any(|a| a.user.email.eq_ignore_ascii_case(&input.email)) {
        errors.insert("email", "user with this Email Address already exists.".to_string());
    }
    if store.accounts.iter().any(|a| a.user.a_number == input.a_number) {
        errors.entry("ANumber").or_insert_with(|| "user with this A-Number already exists.".to_string());
    }
    if !errors.is_empty() {
        tracing::debug!(fields = errors.len(), "registration rejected");
        return Err(field_errors(errors));
    }

    store.next_user_id += 1;
    let user = User {
        id: store.next_user_id,
        username: input.username,
        a_number: input.a_number,
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
        date_joined: Utc::now(),
    };
    store.accounts.push(Account {
        user: user.clone(),
        password: input.password,
    });
    let token = store.token_for(user.id);
    tracing::info!(user_id = user.id, "registered");
    Ok((StatusCode::CREATED, Json(AuthBody { user, token })).into_response())
}

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let user = store
        .accounts
        .iter()
        .find(|a| {
            !input.email.is_empty()
                && a.user.email.eq_ignore_ascii_case(&input.email)
                && a.password == input.password
        })
        .map(|a| a.user.clone())
        .ok_or_else(|| {
            tracing::debug!("login rejected");
            failure(StatusCode::UNAUTHORIZED, "message", "Invalid credentials")
        })?;
    let token = store.token_for(user.id);
    tracing::info!(user_id = user.id, "logged in");
    Ok(Json(AuthBody { user, token }).into_response())
}

async fn current_user(State(db): State<Db>, headers: HeaderMap) -> Result<Response, Failure> {
    let store = db.read().await;
    let user_id = authenticate(&store, &headers)?;
    let user = store.user(user_id).cloned().ok_or_else(not_found)?;
    Ok(Json(user).into_response())
}

async fn list_published(State(db): State<Db>, headers: HeaderMap) -> Result<Response, Failure> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    Ok(Json(store.newest_first(|p| p.status == "published")).into_response())
}

async fn my_posts(State(db): State<Db>, headers: HeaderMap) -> Result<Response, Failure> {
    let store = db.read().await;
    let user_id = authenticate(&store, &headers)?;
    Ok(Json(store.newest_first(|p| p.author.id == user_id)).into_response())
}

async fn get_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    let post = store.own_post_mut(id, user_id)?.clone();
    Ok(Json(post).into_response())
}

/// Validated writable fields of a post.
struct PostFields {
    title: String,
    description: String,
    category: String,
    target_market: Option<String>,
    business_model: Option<String>,
    funding_needs: Option<String>,
    status: String,
}

fn validate_post(input: PostInput) -> Result<PostFields, Failure> {
    let mut errors = BTreeMap::new();
    if input.title.trim().is_empty() {
        errors.insert("Title", "This field is required.".to_string());
    }
    if input.description.trim().is_empty() {
        errors.insert("Description", "This field is required.".to_string());
    }
    let category = input.category.unwrap_or_else(|| "other".to_string());
    if !CATEGORIES.contains(&category.as_str()) {
        errors.insert("Category", format!("\"{category}\" is not a valid choice."));
    }
    let status = input.status.unwrap_or_else(|| "draft".to_string());
    if !STATUSES.contains(&status.as_str()) {
        errors.insert("Status", format!("\"{status}\" is not a valid choice."));
    }
    let funding_needs = match input.funding_needs {
        None | Some(Value::Null) => None,
        Some(value) => {
            let amount = match &value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match amount {
                Some(amount) if amount >= 0.0 => Some(format!("{amount:.2}")),
                _ => {
                    errors.insert("FundingNeeds", "A valid number is required.".to_string());
                    None
                }
            }
        }
    };
    if !errors.is_empty() {
        return Err(field_errors(errors));
    }
    Ok(PostFields {
        title: input.title,
        description: input.description,
        category,
        target_market: input.target_market,
        business_model: input.business_model,
        funding_needs,
        status,
    })
}

async fn create_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<PostInput>,
) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    let fields = validate_post(input)?;
    let author = store.user(user_id).cloned().ok_or_else(not_found)?;

    store.next_post_id += 1;
    let now = Utc::now();
    let post = Post {
        id: store.next_post_id,
        title: fields.title,
        description: fields.description,
        category: fields.category,
        target_market: fields.target_market,
        business_model: fields.business_model,
        funding_needs: fields.funding_needs,
        status: fields.status,
        created_at: now,
        updated_at: now,
        author,
    };
    store.posts.insert(post.id, post.clone());
    tracing::info!(post_id = post.id, "created");
    Ok((StatusCode::CREATED, Json(post)).into_response())
}

async fn update_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<PostInput>,
) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    let post = store.own_post_mut(id, user_id)?;
    let fields = validate_post(input)?;

    post.title = fields.title;
    post.description = fields.description;
    post.category = fields.category;
    post.target_market = fields.target_market;
    post.business_model = fields.business_model;
    post.funding_needs = fields.funding_needs;
    post.status = fields.status;
    post.updated_at = Utc::now();
    Ok(Json(post.clone()).into_response())
}

async fn delete_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    store.own_post_mut(id, user_id)?;
    store.posts.remove(&id);
    tracing::info!(post_id = id, "deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn publish_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    let post = store.own_post_mut(id, user_id)?;
    post.status = "published".to_string();
    post.updated_at = Utc::now();
    tracing::info!(post_id = id, "published");
    Ok(Json(post.clone()).into_response())
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(value: Value) -> PostInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn post_serializes_with_server_field_names() {
        let now = Utc::now();
        let post = Post {
            id: 1,
            title: "Test".to_string(),
            description: "Body".to_string(),
            category: "tech".to_string(),
            target_market: None,
            business_model: None,
            funding_needs: Some("10.00".to_string()),
            status: "draft".to_string(),
            created_at: now,
            updated_at: now,
            author: User {
                id: 1,
                username: "ada".to_string(),
                a_number: "A0001".to_string(),
                email: "ada@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                date_joined: now,
            },
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["PostID"], 1);
        assert_eq!(json["FundingNeeds"], "10.00");
        assert_eq!(json["Author"]["ANumber"], "A0001");
        assert!(json["TargetMarket"].is_null());
    }

    #[test]
    fn validate_post_applies_defaults() {
        let fields = validate_post(input(serde_json::json!({
            "Title": "Idea",
            "Description": "Details",
        })))
        .unwrap_or_else(|_| panic!("expected valid input"));
        assert_eq!(fields.category, "other");
        assert_eq!(fields.status, "draft");
        assert!(fields.funding_needs.is_none());
    }

    #[test]
    fn validate_post_normalizes_funding() {
        let fields = validate_post(input(serde_json::json!({
            "Title": "Idea",
            "Description": "Details",
            "FundingNeeds": 1500,
        })))
        .unwrap_or_else(|_| panic!("expected valid input"));
        assert_eq!(fields.funding_needs.as_deref(), Some("1500.00"));
    }

    #[test]
    fn validate_post_reports_every_bad_field() {
        let Err((status, Json(body))) = validate_post(input(serde_json::json!({
            "Category": "space",
            "FundingNeeds": "lots",
        }))) else {
            panic!("expected validation failure");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        for field in ["Title", "Description", "Category", "FundingNeeds"] {
            assert!(body[field].is_array(), "missing error for {field}");
        }
    }

    #[test]
    fn token_is_reused_per_user() {
        let mut store = Store::default();
        let first = store.token_for(1);
        assert_eq!(store.token_for(1), first);
        assert_ne!(store.token_for(2), first);
        assert_eq!(first.len(), 32);
    }
}
