// src/testing.rs
//! In-process stand-in for the favourites backend, used by the unit tests.
use crate::models::{AddFavoriteRequest, FavoriteItem};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

struct RecordedRequest {
    request: String,
    user: Option<String>,
    content_type: Option<String>,
}

pub struct MockState {
    favorites: Mutex<HashMap<String, Vec<FavoriteItem>>>,
    prices: Mutex<HashMap<String, Value>>,
    malformed: Mutex<HashSet<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fail_load: AtomicBool,
    fail_add: AtomicBool,
    fail_remove: AtomicBool,
    info_gate: watch::Sender<bool>,
}

impl MockState {
    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let (info_gate, _) = watch::channel(true);
        let state = Arc::new(MockState {
            favorites: Mutex::new(HashMap::new()),
            prices: Mutex::new(HashMap::new()),
            malformed: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
            fail_load: AtomicBool::new(false),
            fail_add: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            info_gate,
        });
        let (addr, server) = warp::serve(routes(state.clone())).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        MockBackend {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn http_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    pub fn with_favorites(&self, user: &str, symbols: &[&str]) {
        let items = symbols
            .iter()
            .map(|symbol| FavoriteItem {
                symbol: symbol.to_string(),
                name: known_name(symbol),
            })
            .collect();
        self.state
            .favorites
            .lock()
            .unwrap()
            .insert(user.to_string(), items);
    }

    pub fn favorites(&self, user: &str) -> Vec<String> {
        self.state
            .favorites
            .lock()
            .unwrap()
            .get(user)
            .map(|items| items.iter().map(|item| item.symbol.clone()).collect())
            .unwrap_or_default()
    }

    /// `data` becomes the `data` member of the external-info envelope.
    pub fn set_info(&self, coin_id: &str, data: Value) {
        self.state
            .prices
            .lock()
            .unwrap()
            .insert(coin_id.to_string(), data);
    }

    pub fn set_malformed_info(&self, coin_id: &str) {
        self.state
            .malformed
            .lock()
            .unwrap()
            .insert(coin_id.to_string());
    }

    pub fn fail_load(&self, fail: bool) {
        self.state.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_add(&self, fail: bool) {
        self.state.fail_add.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.state.fail_remove.store(fail, Ordering::SeqCst);
    }

    /// Holds every external-info response until `open_info_gate`.
    pub fn close_info_gate(&self) {
        self.state.info_gate.send_replace(false);
    }

    pub fn open_info_gate(&self) {
        self.state.info_gate.send_replace(true);
    }

    /// Requests seen so far, as `"METHOD /raw/path"`.
    pub fn requests(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|recorded| recorded.request.clone())
            .collect()
    }

    pub fn count(&self, request: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == request).count()
    }

    pub fn user_headers(&self) -> Vec<Option<String>> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|recorded| recorded.user.clone())
            .collect()
    }

    /// `Content-Type` of every request matching `request`.
    pub fn content_types(&self, request: &str) -> Vec<Option<String>> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| recorded.request == request)
            .map(|recorded| recorded.content_type.clone())
            .collect()
    }
}

fn known_name(symbol: &str) -> Option<String> {
    match symbol {
        "btc" => Some("Bitcoin".to_string()),
        "eth" => Some("Ethereum".to_string()),
        "sol" => Some("Solana".to_string()),
        _ => None,
    }
}

fn routes(
    state: Arc<MockState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let record = warp::method()
        .and(warp::path::full())
        .and(warp::header::optional::<String>("x-user-id"))
        .and(warp::header::optional::<String>("content-type"))
        .and(with_state(state.clone()))
        .map(
            |method: Method,
             path: FullPath,
             user: Option<String>,
             content_type: Option<String>,
             state: Arc<MockState>| {
                state.record(RecordedRequest {
                    request: format!("{} {}", method, path.as_str()),
                    user,
                    content_type,
                });
            },
        )
        .untuple_one();

    let list = warp::path!("coins")
        .and(warp::get())
        .and(warp::header::optional::<String>("x-user-id"))
        .and(with_state(state.clone()))
        .map(list_favorites);

    let add = warp::path!("coins")
        .and(warp::post())
        .and(warp::header::optional::<String>("x-user-id"))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .map(add_favorite);

    let remove = warp::path!("coins" / String)
        .and(warp::delete())
        .and(warp::header::optional::<String>("x-user-id"))
        .and(with_state(state.clone()))
        .map(remove_favorite);

    let info = warp::path!("coins" / String / "external-info")
        .and(warp::get())
        .and(with_state(state))
        .and_then(external_info);

    record.and(list.or(add).or(remove).or(info))
}

fn with_state(
    state: Arc<MockState>,
) -> impl Filter<Extract = (Arc<MockState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
        .into_response()
}

fn valid_user(user: Option<String>) -> Option<String> {
    user.map(|u| u.trim().to_string())
        .filter(|u| u.parse::<i64>().is_ok())
}

fn list_favorites(user: Option<String>, state: Arc<MockState>) -> Response {
    let Some(user) = valid_user(user) else {
        return error_reply(StatusCode::BAD_REQUEST, "Missing or invalid X-User-Id header");
    };
    if state.fail_load.load(Ordering::SeqCst) {
        return error_reply(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let items = state
        .favorites
        .lock()
        .unwrap()
        .get(&user)
        .cloned()
        .unwrap_or_default();
    warp::reply::json(&json!({ "items": items })).into_response()
}

fn add_favorite(
    user: Option<String>,
    body: AddFavoriteRequest,
    state: Arc<MockState>,
) -> Response {
    let Some(user) = valid_user(user) else {
        return error_reply(StatusCode::BAD_REQUEST, "Missing or invalid X-User-Id header");
    };
    if state.fail_add.load(Ordering::SeqCst) {
        return error_reply(StatusCode::NOT_FOUND, "Coin not found");
    }
    let item = FavoriteItem {
        name: known_name(&body.symbol),
        symbol: body.symbol,
    };
    state
        .favorites
        .lock()
        .unwrap()
        .entry(user)
        .or_default()
        .push(item.clone());
    warp::reply::with_status(warp::reply::json(&item), StatusCode::CREATED).into_response()
}

fn remove_favorite(raw_symbol: String, user: Option<String>, state: Arc<MockState>) -> Response {
    let Some(user) = valid_user(user) else {
        return error_reply(StatusCode::BAD_REQUEST, "Missing or invalid X-User-Id header");
    };
    if state.fail_remove.load(Ordering::SeqCst) {
        return error_reply(StatusCode::INTERNAL_SERVER_ERROR, "delete failed");
    }
    let symbol = urlencoding::decode(&raw_symbol)
        .map(|s| s.into_owned())
        .unwrap_or(raw_symbol);

    let mut favorites = state.favorites.lock().unwrap();
    let items = favorites.entry(user).or_default();
    let before = items.len();
    items.retain(|item| item.symbol != symbol);
    if items.len() == before {
        return error_reply(StatusCode::NOT_FOUND, "Favourite not found");
    }
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response()
}

async fn external_info(coin_id: String, state: Arc<MockState>) -> Result<Response, Rejection> {
    let mut gate = state.info_gate.subscribe();
    let opened = gate.wait_for(|open| *open).await.is_ok();
    if !opened {
        return Ok(error_reply(StatusCode::SERVICE_UNAVAILABLE, "gate dropped"));
    }

    if state.malformed.lock().unwrap().contains(&coin_id) {
        return Ok(warp::reply::html("<html>rate limited</html>").into_response());
    }
    let data = state.prices.lock().unwrap().get(&coin_id).cloned();
    match data {
        Some(data) => Ok(warp::reply::json(&json!({ "source": "coingecko", "data": data }))
            .into_response()),
        None => Ok(error_reply(
            StatusCode::NOT_FOUND,
            "Coin not found in external API",
        )),
    }
}
