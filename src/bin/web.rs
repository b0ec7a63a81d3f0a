//! Single binary web server: JSON API for live futsal match tracking.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default; a read-only scoreboard is served under /static.
//! Override with env (or a .env file): HOST, PORT, INACTIVITY_TIMEOUT_HOURS.

use actix_files::Files;
use actix_web::{
    get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use futsal_match_web::{
    authorize, import_player_times, Command, ImportFormat, MatchController, MatchError, MatchId,
    PersistedMatch, Period, PlayerId, Role, Roster, RosterEntry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-match entry: controller + time of the last mutation (for auto-cleanup).
struct MatchEntry {
    controller: MatchController,
    last_activity: Instant,
}

/// In-memory state: matches by ID. One write lock serializes all mutations.
type AppState = Data<RwLock<HashMap<MatchId, MatchEntry>>>;

/// Header carrying the caller's role, set by the authenticating proxy.
const ROLE_HEADER: &str = "x-coach-role";

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// One roster player; `id` is generated when absent.
#[derive(Deserialize)]
struct RosterPlayerBody {
    #[serde(default)]
    id: Option<PlayerId>,
    #[serde(flatten)]
    entry: RosterEntry,
}

#[derive(Deserialize)]
struct CreateMatchBody {
    players: Vec<RosterPlayerBody>,
}

#[derive(Deserialize)]
struct CommandBody {
    #[serde(default)]
    expected_revision: Option<u64>,
    command: Command,
}

#[derive(Deserialize)]
struct ImportBody {
    #[serde(default)]
    expected_revision: Option<u64>,
    #[serde(default)]
    format: ImportFormat,
    text: String,
}

#[derive(Deserialize)]
struct HydrateBody {
    persisted: PersistedMatch,
    players: Vec<RosterPlayerBody>,
}

#[derive(Deserialize)]
struct EventsQuery {
    #[serde(default)]
    period: Option<Period>,
}

/// Path segment: match id (e.g. /api/matches/{id})
#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

/// What the UI needs to render a match.
#[derive(Serialize)]
struct MatchView<'a> {
    match_id: MatchId,
    revision: u64,
    roster: &'a Roster,
    clock: &'a futsal_match_web::Clock,
    snapshot: &'a futsal_match_web::StatisticsSnapshot,
}

impl<'a> MatchView<'a> {
    fn of(c: &'a MatchController) -> Self {
        Self {
            match_id: c.match_id(),
            revision: c.revision(),
            roster: c.roster(),
            clock: c.clock(),
            snapshot: c.snapshot(),
        }
    }
}

fn build_roster(players: Vec<RosterPlayerBody>) -> Roster {
    let mut roster = Roster::new();
    for p in players {
        match p.id {
            Some(id) => roster.insert(id, p.entry),
            None => {
                roster.add(p.entry);
            }
        }
    }
    roster
}

fn error_response(e: &MatchError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        MatchError::Forbidden { .. } => HttpResponse::Forbidden().json(body),
        e if e.is_conflict() => HttpResponse::Conflict().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Role from the request header; missing means read-only.
fn caller_role(req: &HttpRequest) -> Result<Role, HttpResponse> {
    let Some(value) = req.headers().get(ROLE_HEADER) else {
        return Ok(Role::Viewer);
    };
    value
        .to_str()
        .map_err(|e| e.to_string())
        .and_then(|s| s.parse::<Role>())
        .map_err(|e| HttpResponse::BadRequest().json(serde_json::json!({ "error": e })))
}

fn no_match() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No match" }))
}

/// Check the role and revision, then apply `command` to the entry's controller.
fn run_command(
    entry: &mut MatchEntry,
    role: Role,
    expected_revision: Option<u64>,
    command: Command,
) -> HttpResponse {
    entry.last_activity = Instant::now();
    let c = &mut entry.controller;
    let result = authorize(role, &command)
        .and_then(|()| expected_revision.map_or(Ok(()), |r| c.check_revision(r)))
        .and_then(|()| c.apply(command));
    match result {
        Ok(_) => HttpResponse::Ok().json(MatchView::of(c)),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "futsal-match-web",
    })
}

/// Schedule a new match for the given roster (returns it with id).
#[post("/api/matches")]
async fn api_create_match(state: AppState, req: HttpRequest, body: Json<CreateMatchBody>) -> HttpResponse {
    match caller_role(&req) {
        Ok(Role::Viewer) => {
            return error_response(&MatchError::Forbidden {
                role: Role::Viewer.to_string(),
                action: "create a match",
            })
        }
        Ok(_) => {}
        Err(resp) => return resp,
    }
    let roster = build_roster(body.into_inner().players);
    let controller = match MatchController::new(roster) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    let id = controller.match_id();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    log::info!("Scheduled match {} ({} players)", id, controller.roster().len());
    let entry = g.entry(id).or_insert(MatchEntry {
        controller,
        last_activity: Instant::now(),
    });
    HttpResponse::Ok().json(MatchView::of(&entry.controller))
}

/// Get a match by id (404 if not found). Reads do not count as activity.
#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(MatchView::of(&entry.controller)),
        None => no_match(),
    }
}

/// Ledger events in order, optionally restricted to one period.
#[get("/api/matches/{id}/events")]
async fn api_match_events(state: AppState, path: Path<MatchPath>, query: Query<EventsQuery>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let Some(entry) = g.get(&path.id) else {
        return no_match();
    };
    let ledger = entry.controller.ledger();
    match query.period {
        Some(period) => HttpResponse::Ok().json(ledger.events_for(period).collect::<Vec<_>>()),
        None => HttpResponse::Ok().json(ledger.events()),
    }
}

/// Apply one command (goal, card, substitution, clock control, undo, finalize).
#[post("/api/matches/{id}/commands")]
async fn api_apply_command(
    state: AppState,
    req: HttpRequest,
    path: Path<MatchPath>,
    body: Json<CommandBody>,
) -> HttpResponse {
    let role = match caller_role(&req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let Some(entry) = g.get_mut(&path.id) else {
        return no_match();
    };
    let CommandBody {
        expected_revision,
        command,
    } = body.into_inner();
    run_command(entry, role, expected_revision, command)
}

/// Parse pasted player times and set those players' minutes (admins only).
#[post("/api/matches/{id}/import")]
async fn api_import_minutes(
    state: AppState,
    req: HttpRequest,
    path: Path<MatchPath>,
    body: Json<ImportBody>,
) -> HttpResponse {
    let role = match caller_role(&req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let Some(entry) = g.get_mut(&path.id) else {
        return no_match();
    };
    let command = match import_player_times(&body.text, body.format, entry.controller.roster()) {
        Ok(c) => c,
        Err(e) => return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    };
    run_command(entry, role, body.expected_revision, command)
}

/// Durable form of the match for the persistence layer.
#[get("/api/matches/{id}/persisted")]
async fn api_export_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(entry.controller.persisted()),
        None => no_match(),
    }
}

/// Rehydrate a match from persisted state at the start of a session.
#[put("/api/matches/{id}")]
async fn api_hydrate_match(
    state: AppState,
    req: HttpRequest,
    path: Path<MatchPath>,
    body: Json<HydrateBody>,
) -> HttpResponse {
    match caller_role(&req) {
        Ok(Role::Viewer) => {
            return error_response(&MatchError::Forbidden {
                role: Role::Viewer.to_string(),
                action: "load a match",
            })
        }
        Ok(_) => {}
        Err(resp) => return resp,
    }
    let HydrateBody { persisted, players } = body.into_inner();
    if persisted.match_id != path.id {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Match id does not match path" }));
    }
    let controller = match MatchController::hydrate(persisted, build_roster(players)) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    if let Some(existing) = g.get(&path.id) {
        if existing.controller.revision() > controller.revision() {
            return error_response(&MatchError::StaleRevision {
                expected: controller.revision(),
                actual: existing.controller.revision(),
            });
        }
    }
    g.insert(
        path.id,
        MatchEntry {
            controller,
            last_activity: Instant::now(),
        },
    );
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(MatchView::of(&entry.controller)),
        None => no_match(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_inactivity_hours() -> u64 {
    12
}

fn timeout_from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let inactivity_hours: u64 = std::env::var("INACTIVITY_TIMEOUT_HOURS")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or_else(default_inactivity_hours);
    let inactivity_timeout = timeout_from_hours(inactivity_hours);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<MatchId, MatchEntry>::new()));

    // Background task: every 30 minutes, drop matches nobody has touched within the timeout
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < inactivity_timeout);
            let removed = before - g.len();
            if removed > 0 {
                log::info!(
                    "Cleaned up {} inactive match(es) (no activity for {}h)",
                    removed,
                    inactivity_hours
                );
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_match)
            .service(api_get_match)
            .service(api_match_events)
            .service(api_apply_command)
            .service(api_import_minutes)
            .service(api_export_match)
            .service(api_hydrate_match)
            .service(Files::new("/static", "static").index_file("index.html"))
    })
    .bind(bind)?
    .run()
    .await
}
