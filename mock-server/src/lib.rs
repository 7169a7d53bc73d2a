use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const API_PREFIX: &str = "/api/v2";

const FAULTS_PATH: &str = "/__faults";

struct Fixture {
    id: u32,
    name: &'static str,
    height: u32,
    weight: u32,
    color: &'static str,
    types: &'static [&'static str],
}

const FIXTURES: &[Fixture] = &[
    Fixture { id: 1, name: "bulbasaur", height: 7, weight: 69, color: "green", types: &["grass", "poison"] },
    Fixture { id: 2, name: "ivysaur", height: 10, weight: 130, color: "green", types: &["grass", "poison"] },
    Fixture { id: 3, name: "venusaur", height: 20, weight: 1000, color: "green", types: &["grass", "poison"] },
    Fixture { id: 4, name: "charmander", height: 6, weight: 85, color: "red", types: &["fire"] },
];

/// A canned misbehaviour for every request whose path starts with
/// `path_prefix`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    pub path_prefix: String,
    #[serde(flatten)]
    pub kind: FaultKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaultKind {
    Status { status: u16, body: String },
    EmptyBody,
    Delay { millis: u64 },
}

#[derive(Clone, Default)]
pub struct MockState {
    faults: Arc<RwLock<Vec<Fault>>>,
}

impl MockState {
    pub async fn inject(&self, fault: Fault) {
        info!(prefix = %fault.path_prefix, kind = ?fault.kind, "fault injected");
        self.faults.write().await.push(fault);
    }

    pub async fn clear(&self) {
        self.faults.write().await.clear();
    }

    /// Most recently injected fault matching `path`.
    async fn fault_for(&self, path: &str) -> Option<FaultKind> {
        let faults = self.faults.read().await;
        faults
            .iter()
            .rev()
            .find(|fault| path.starts_with(&fault.path_prefix))
            .map(|fault| fault.kind.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

pub fn app() -> Router {
    app_with(MockState::default())
}

pub fn app_with(state: MockState) -> Router {
    let api = Router::new()
        .route("/pokemon", get(list_pokemon))
        .route("/pokemon/{id}", get(get_pokemon))
        .route("/pokemon-species/{id}", get(get_species));

    Router::new()
        .nest(API_PREFIX, api)
        .route(FAULTS_PATH, post(add_fault).delete(clear_faults))
        .layer(middleware::from_fn_with_state(state.clone(), apply_faults))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockState::default()).await
}

pub async fn run_with(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(state)).await
}

async fn apply_faults(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if path.starts_with(FAULTS_PATH) {
        return next.run(request).await;
    }
    match state.fault_for(&path).await {
        Some(FaultKind::Status { status, body }) => {
            debug!(%path, status, "serving injected status");
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Some(FaultKind::EmptyBody) => {
            debug!(%path, "serving injected empty body");
            StatusCode::OK.into_response()
        }
        Some(FaultKind::Delay { millis }) => {
            debug!(%path, millis, "delaying response");
            tokio::time::sleep(Duration::from_millis(millis)).await;
            next.run(request).await
        }
        None => next.run(request).await,
    }
}

async fn add_fault(State(state): State<MockState>, Json(fault): Json<Fault>) -> StatusCode {
    state.inject(fault).await;
    StatusCode::NO_CONTENT
}

async fn clear_faults(State(state): State<MockState>) -> StatusCode {
    state.clear().await;
    StatusCode::NO_CONTENT
}

async fn list_pokemon(Query(params): Query<PageParams>) -> Json<Value> {
    let results: Vec<Value> = FIXTURES
        .iter()
        .skip(params.offset)
        .take(params.limit)
        .map(|entry| json!({ "name": entry.name, "url": resource_url("pokemon", entry.id) }))
        .collect();

    let next_offset = params.offset.saturating_add(params.limit);
    let next = (next_offset < FIXTURES.len()).then(|| {
        format!(
            "https://pokeapi.co/api/v2/pokemon?offset={next_offset}&limit={}",
            params.limit
        )
    });
    let previous = (params.offset > 0).then(|| {
        format!(
            "https://pokeapi.co/api/v2/pokemon?offset={}&limit={}",
            params.offset.saturating_sub(params.limit),
            params.limit
        )
    });

    Json(json!({
        "count": FIXTURES.len(),
        "next": next,
        "previous": previous,
        "results": results,
    }))
}

async fn get_pokemon(Path(id): Path<u32>) -> Result<Json<Value>, StatusCode> {
    let entry = fixture(id).ok_or(StatusCode::NOT_FOUND)?;
    let (id, name) = (entry.id, entry.name);
    let types: Vec<Value> = entry
        .types
        .iter()
        .enumerate()
        .map(|(slot, kind)| {
            json!({
                "slot": slot + 1,
                "type": { "name": kind, "url": "https://pokeapi.co/api/v2/type/1/" },
            })
        })
        .collect();

    Ok(Json(json!({
        "id": id,
        "name": name,
        "height": entry.height,
        "weight": entry.weight,
        "base_experience": 64,
        "species": { "name": name, "url": resource_url("pokemon-species", id) },
        "sprites": {
            "front_default": format!("https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/{id}.png"),
            "front_shiny": null,
        },
        "abilities": [
            {
                "ability": { "name": "overgrow", "url": "https://pokeapi.co/api/v2/ability/65/" },
                "is_hidden": false,
                "slot": 1,
            },
            {
                "ability": { "name": "chlorophyll", "url": "https://pokeapi.co/api/v2/ability/34/" },
                "is_hidden": true,
                "slot": 3,
            },
        ],
        "stats": [
            { "base_stat": 45, "effort": 0, "stat": { "name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/" } },
            { "base_stat": 49, "effort": 0, "stat": { "name": "attack", "url": "https://pokeapi.co/api/v2/stat/2/" } },
        ],
        "types": types,
    })))
}

async fn get_species(Path(id): Path<u32>) -> Result<Json<Value>, StatusCode> {
    let entry = fixture(id).ok_or(StatusCode::NOT_FOUND)?;
    let (id, name, color) = (entry.id, entry.name, entry.color);
    Ok(Json(json!({
        "id": id,
        "name": name,
        "color": { "name": color, "url": "https://pokeapi.co/api/v2/pokemon-color/5/" },
        "flavor_text_entries": [
            {
                "flavor_text": format!("{name} was\nspotted in the wild."),
                "language": { "name": "en", "url": "https://pokeapi.co/api/v2/language/9/" },
            }
        ],
        "habitat": { "name": "grassland", "url": "https://pokeapi.co/api/v2/pokemon-habitat/3/" },
        "is_baby": false,
        "names": [
            { "language": { "name": "en", "url": "https://pokeapi.co/api/v2/language/9/" }, "name": name }
        ],
        "shape": { "name": "quadruped", "url": "https://pokeapi.co/api/v2/pokemon-shape/8/" },
        "varieties": [
            { "is_default": true, "pokemon": { "name": name, "url": resource_url("pokemon", id) } }
        ],
    })))
}

fn fixture(id: u32) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|entry| entry.id == id)
}

fn resource_url(kind: &str, id: u32) -> String {
    format!("https://pokeapi.co/api/v2/{kind}/{id}/")
}
