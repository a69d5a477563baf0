//! HTTP handler functions for the dashboard API.

use std::collections::BTreeMap;
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Instant;

use actix_web::{HttpResponse, web};
use bess_map_dashboard::Session;
use bess_map_dashboard::session::columns as session_columns;
use bess_map_server_models::{
    ApiError, ApiHealth, ApiSessionCreated, ChartQueryParams, FilterSpec, SelectRequest,
};
use uuid::Uuid;

use crate::{AppState, SessionEntry, sweep_expired};

/// Locks the session map after dropping sessions that have been idle for
/// the configured TTL.
fn live_sessions(state: &AppState) -> MutexGuard<'_, BTreeMap<Uuid, SessionEntry>> {
    let mut sessions = state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    sweep_expired(&mut sessions, state.session_ttl, Instant::now());
    sessions
}

fn unknown_session(id: Uuid) -> HttpResponse {
    HttpResponse::NotFound().json(ApiError::new(format!("Unknown session {id}")))
}

/// Runs `f` against the session `id`, or answers 404 if there is none.
/// Touching a session keeps it alive.
fn with_session(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut Session) -> HttpResponse,
) -> HttpResponse {
    let mut sessions = live_sessions(state);
    match sessions.get_mut(&id) {
        Some(entry) => {
            entry.last_access = Instant::now();
            f(&mut entry.session)
        }
        None => unknown_session(id),
    }
}

fn view_response(state: &AppState, session: &Session) -> HttpResponse {
    HttpResponse::Ok().json(session.view(&state.config, state.previews.as_ref()))
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let sessions = live_sessions(&state).len();
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        rows: state.dataset.rows().len(),
        sessions,
    })
}

/// `GET /api/columns`
///
/// Lists the columns offered by the filter and chart controls.
pub async fn columns(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(session_columns(&state.dataset))
}

/// `POST /api/sessions`
pub async fn create_session(state: web::Data<AppState>) -> HttpResponse {
    let session_id = Uuid::new_v4();
    let session = Session::new(Arc::clone(&state.dataset));
    live_sessions(&state).insert(session_id, SessionEntry::new(session));
    log::info!("Created session {session_id}");
    HttpResponse::Created().json(ApiSessionCreated { session_id })
}

/// `GET /api/sessions/{id}`
///
/// Returns the session's current dashboard view.
pub async fn get_session(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    with_session(&state, id, |session| view_response(&state, session))
}

/// `DELETE /api/sessions/{id}`
pub async fn delete_session(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    let removed = live_sessions(&state).remove(&id);
    if removed.is_some() {
        log::info!("Ended session {id}");
        HttpResponse::NoContent().finish()
    } else {
        unknown_session(id)
    }
}

/// `POST /api/sessions/{id}/reset`
///
/// Clears the filter and the selection.
pub async fn reset_session(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    with_session(&state, id, |session| {
        session.reset();
        view_response(&state, session)
    })
}

/// `POST /api/sessions/{id}/filter`
///
/// Applies a `{column, value}` filter. A rejected filter answers 400 and
/// leaves the session as it was.
pub async fn apply_filter(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<FilterSpec>,
) -> HttpResponse {
    let id = path.into_inner();
    let spec = body.into_inner();
    with_session(&state, id, |session| match session.apply_filter(spec) {
        Ok(()) => view_response(&state, session),
        Err(e) => {
            let message = session.status().map_or_else(|| e.to_string(), ToString::to_string);
            HttpResponse::BadRequest().json(ApiError::new(message))
        }
    })
}

/// `POST /api/sessions/{id}/filter/reset`
pub async fn reset_filter(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    with_session(&state, id, |session| {
        session.reset_filter();
        view_response(&state, session)
    })
}

/// `POST /api/sessions/{id}/select`
///
/// Applies one synchronization step of selection triggers.
pub async fn select(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SelectRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let triggers = body.into_inner().triggers;
    with_session(&state, id, |session| {
        session.dispatch_step(triggers);
        view_response(&state, session)
    })
}

/// `GET /api/sessions/{id}/chart?column=`
///
/// Counts the session's filtered rows by `column` (the country column if
/// omitted).
pub async fn chart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    params: web::Query<ChartQueryParams>,
) -> HttpResponse {
    let id = path.into_inner();
    let column = params
        .into_inner()
        .column
        .unwrap_or_else(|| state.dataset.schema().country.clone());
    with_session(&state, id, |session| match session.chart(&column) {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(e) => HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use bess_map_dashboard::DashboardConfig;
    use bess_map_incident::Dataset;
    use bess_map_preview::cache::PreviewCache;
    use bess_map_server_models::{ChartData, ColumnsView, DashboardView};
    use bess_map_source::csv_file::parse_csv;

    use super::*;
    use crate::configure;

    const CSV: &str = "Location,Country,Capacity (MW),Date of Incident,\"Custom location (Lat, Lon)\",Source URL 1
\"Plant A, Inc.\",USA,5,2021-07-30,\"10,20\",https://example.com/a.jpg
Plant A Inc,USA,20,,\"10,20\",
Plant B,Germany,60,2022-01-01,bad,https://example.com/b
";

    fn app_state() -> AppState {
        let config = DashboardConfig::embedded();
        let table = parse_csv(CSV.as_bytes(), b',').unwrap();
        let dataset = Dataset::ingest(config.schema.clone(), table).unwrap();
        AppState::new(dataset, config, PreviewCache::new())
    }

    fn state() -> web::Data<AppState> {
        web::Data::new(app_state())
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    macro_rules! create {
        ($app:expr) => {{
            let req = test::TestRequest::post().uri("/api/sessions").to_request();
            let created: ApiSessionCreated = test::call_and_read_body_json(&$app, req).await;
            created.session_id
        }};
    }

    #[actix_web::test]
    async fn session_starts_with_all_locations() {
        let state = state();
        let app = app!(state);
        let id = create!(app);

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{id}"))
            .to_request();
        let view: DashboardView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.cards.len(), 2);
        assert_eq!(view.cards[0].title, "Plant A, Inc. (2 incidents)");
        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.selected, None);
    }

    #[actix_web::test]
    async fn invalid_numeric_filter_is_bad_request() {
        let state = state();
        let app = app!(state);
        let id = create!(app);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/filter"))
            .set_json(FilterSpec::new("Capacity (MW)", "lots"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "Invalid numerical filter value.");

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{id}"))
            .to_request();
        let view: DashboardView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.cards.len(), 2);
        assert_eq!(view.filter, None);
    }

    #[actix_web::test]
    async fn filter_select_and_reset() {
        let state = state();
        let app = app!(state);
        let id = create!(app);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/select"))
            .set_json(serde_json::json!({
                "triggers": [
                    {"type": "cardClicked", "locationKey": "Plant A Inc"},
                    {"type": "mapClicked", "label": "Plant B"}
                ]
            }))
            .to_request();
        let view: DashboardView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.selected.as_ref().map(ToString::to_string).as_deref(), Some("Plant B"));
        assert_eq!(view.scroll_to.as_deref(), Some("card-Plant B"));

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/filter"))
            .set_json(FilterSpec::new("Country", "usa"))
            .to_request();
        let view: DashboardView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.cards.len(), 1);
        assert_eq!(view.scroll_to, None);
        assert_eq!(view.status.as_deref(), Some("Filter applied."));

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{id}/chart"))
            .to_request();
        let chart: ChartData = test::call_and_read_body_json(&app, req).await;
        assert_eq!(chart.bars.len(), 1);
        assert_eq!(chart.bars[0].count, 2);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/filter/reset"))
            .to_request();
        let view: DashboardView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.cards.len(), 2);
        assert_eq!(view.scroll_to.as_deref(), Some("card-Plant B"));
        assert_eq!(view.status.as_deref(), Some("Filter reset."));
    }

    #[actix_web::test]
    async fn unknown_session_is_not_found() {
        let state = state();
        let app = app!(state);
        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn deleted_session_is_gone() {
        let state = state();
        let app = app!(state);
        let id = create!(app);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/sessions/{id}"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );
        let req = test::TestRequest::delete()
            .uri(&format!("/api/sessions/{id}"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn reset_clears_filter_and_selection() {
        let state = state();
        let app = app!(state);
        let id = create!(app);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/select"))
            .set_json(serde_json::json!({
                "triggers": [{"type": "cardClicked", "locationKey": "Plant B"}]
            }))
            .to_request();
        let _: DashboardView = test::call_and_read_body_json(&app, req).await;
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/filter"))
            .set_json(FilterSpec::new("Country", "Germany"))
            .to_request();
        let _: DashboardView = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/reset"))
            .to_request();
        let view: DashboardView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.cards.len(), 2);
        assert_eq!(view.selected, None);
        assert_eq!(view.filter, None);
        assert_eq!(view.scroll_to, None);
    }

    #[actix_web::test]
    async fn idle_sessions_expire() {
        let state = web::Data::new(app_state().with_session_ttl(Duration::ZERO));
        let app = app!(state);
        let id = create!(app);

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(state.sessions.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn active_sessions_survive_sweeps() {
        let state = state();
        let app = app!(state);
        let first = create!(app);
        let _second = create!(app);

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{first}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health.sessions, 2);
    }

    #[actix_web::test]
    async fn columns_lists_filter_and_chart_options() {
        let state = state();
        let app = app!(state);
        let req = test::TestRequest::get().uri("/api/columns").to_request();
        let columns: ColumnsView = test::call_and_read_body_json(&app, req).await;
        assert!(columns.filterable.contains(&"Country".to_string()));
        assert!(columns.chartable.contains(&"Year of Incident".to_string()));
    }
}
