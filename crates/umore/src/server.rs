use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::html;
use crate::journal::{Journal, JournalView};
use crate::store::DynStore;
use crate::types::Mood;

/// Application state shared across requests
pub struct AppState {
    pub journal: Mutex<Journal<DynStore>>,
    clock: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(journal: Journal<DynStore>) -> Self {
        Self::with_clock(journal, local_today)
    }

    /// Use `clock` instead of the system date to decide which day is today
    pub fn with_clock(journal: Journal<DynStore>, clock: fn() -> NaiveDate) -> Self {
        Self {
            journal: Mutex::new(journal),
            clock,
        }
    }

    /// Lock the journal, moving "today" forward if the date changed since the last request
    async fn lock_journal(&self) -> tokio::sync::MutexGuard<'_, Journal<DynStore>> {
        let mut journal = self.journal.lock().await;
        journal.set_today((self.clock)());
        journal
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/state", get(state_handler))
        .route("/api/select/{index}", post(select_handler))
        .route("/api/deselect", post(deselect_handler))
        .route("/api/mood/{color}", post(mood_handler))
        .route("/api/remove", post(remove_handler))
        .route("/api/clear", post(clear_handler))
        .route("/api/dark-mode", post(dark_mode_handler))
        .with_state(state)
}

/// Start the web server
pub async fn serve(port: u16, journal: Journal<DynStore>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(journal));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(url = %format!("http://{}", addr), "Server running, press Ctrl+C to stop");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the main HTML page
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let journal = state.lock_journal().await;
    let markup = html::render_page(&journal.view());
    Html(markup.into_string())
}

/// Return the journal as JSON
async fn state_handler(State(state): State<Arc<AppState>>) -> Json<JournalView> {
    Json(state.lock_journal().await.view())
}

async fn select_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Json<JournalView> {
    let mut journal = state.lock_journal().await;
    journal.select(index);
    debug!(index, selected = ?journal.selected(), "Select");
    Json(journal.view())
}

async fn deselect_handler(State(state): State<Arc<AppState>>) -> Json<JournalView> {
    let mut journal = state.lock_journal().await;
    journal.deselect();
    Json(journal.view())
}

async fn mood_handler(
    State(state): State<Arc<AppState>>,
    Path(color): Path<String>,
) -> Result<Json<JournalView>, (StatusCode, String)> {
    let mood: Mood = color
        .parse()
        .map_err(|e: crate::types::UnknownMood| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut journal = state.lock_journal().await;
    journal.set_mood(mood);
    Ok(Json(journal.view()))
}

async fn remove_handler(State(state): State<Arc<AppState>>) -> Json<JournalView> {
    let mut journal = state.lock_journal().await;
    journal.remove_mood();
    Json(journal.view())
}

/// The page asks for confirmation before posting here
async fn clear_handler(State(state): State<Arc<AppState>>) -> Json<JournalView> {
    let mut journal = state.lock_journal().await;
    journal.clear_all();
    Json(journal.view())
}

async fn dark_mode_handler(State(state): State<Arc<AppState>>) -> Json<JournalView> {
    let mut journal = state.lock_journal().await;
    journal.toggle_dark_mode();
    Json(journal.view())
}
