//! Browser-facing dashboard: server-rendered HTML plus JSON API endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::models::{Actuator, Overview, Sensor};
use crate::poller::Poller;
use crate::state::StateHandle;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub poller: Arc<Poller>,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle, poller: Arc<Poller>) -> Router {
    let dashboard_state = DashboardState { state, poller };

    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_handler))
        .route("/api/state", get(state_handler))
        .route("/api/select", post(select_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

#[derive(Debug, Deserialize)]
struct SelectForm {
    #[serde(default)]
    greenhouse_id: String,
}

async fn select_handler(
    State(dashboard): State<DashboardState>,
    Form(form): Form<SelectForm>,
) -> impl IntoResponse {
    let selection = match form.greenhouse_id.trim() {
        "" => None,
        raw => match raw.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Ignoring malformed greenhouse selection {:?}", raw);
                None
            }
        },
    };

    dashboard.poller.select(selection).await;
    Redirect::to("/")
}

async fn login_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>GreenGrow - Login</title>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 640px; margin: 0 auto; padding: 1rem;">
    <h1>&#127793; GreenGrow</h1>
    <p>No active session. Sign in through the GreenGrow login flow so it can
    store a fresh access token, then reload this page.</p>
    <p><a href="/">Back to dashboard</a></p>
</body>
</html>"#,
    )
}

async fn index_handler(State(dashboard): State<DashboardState>) -> axum::response::Response {
    let state = dashboard.state.read().await;

    let Some(user) = &state.user else {
        return Redirect::to("/login").into_response();
    };

    let initial = user
        .display_name()
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "U".to_string());

    let options: String = state
        .greenhouses
        .iter()
        .map(|g| {
            let selected = if state.selected == Some(g.id) {
                " selected"
            } else {
                ""
            };
            format!(r#"<option value="{}"{}>{}</option>"#, g.id, selected, g.label())
        })
        .collect();

    let status_line = if state.loading {
        r#"<p style="color: #6c757d;">Loading environment data...</p>"#.to_string()
    } else if let Some(error) = &state.error {
        format!(r#"<p style="color: #dc3545;">Error: {error}</p>"#)
    } else {
        String::new()
    };

    // Detail is the authoritative name/location; the overview fills in until
    // the detail fetch lands.
    let greenhouse_info = match (&state.greenhouse, &state.overview) {
        (Some(greenhouse), _) => Some((greenhouse.label(), greenhouse.location.clone())),
        (None, Some(overview)) => Some((
            overview.name.clone().unwrap_or_else(|| "Unnamed".to_string()),
            overview.location.clone(),
        )),
        (None, None) => None,
    };
    let greenhouse_card = match greenhouse_info {
        Some((name, location)) => format!(
            r#"<section style="background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,.15); border-radius: 6px; padding: 1.5rem; margin-bottom: 1.5rem;">
            <h3 style="margin-top: 0;">Greenhouse: {}</h3>
            <p style="color: #6c757d;">Location: {}</p>
        </section>"#,
            name,
            location.as_deref().unwrap_or("Unknown"),
        ),
        None => String::new(),
    };

    let overview_section = match &state.overview {
        Some(overview) => format!(
            "{}{}",
            actuators_card(overview),
            alerts_card(&overview.alerts)
        ),
        None => match &state.overview_error {
            Some(error) => format!(r#"<p style="color: #dc3545;">{error}</p>"#),
            None if state.selected.is_some() => {
                r#"<p style="color: #6c757d;">No overview data available for the selected greenhouse.</p>"#.to_string()
            }
            None => {
                r#"<p style="color: #6c757d;">Please select a greenhouse to view the overview.</p>"#.to_string()
            }
        },
    };

    let sensor_items: String = state.sensors.iter().map(|s| sensor_item(s)).collect();
    let sensors_card = if state.selected.is_some() {
        let body = if state.sensors.is_empty() {
            r#"<p style="color: #6c757d;">No sensors found for this greenhouse.</p>"#.to_string()
        } else {
            format!(r#"<ul id="sensor-list" style="list-style: none; padding: 0;">{sensor_items}</ul>"#)
        };
        format!(
            r#"<section style="background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,.15); border-radius: 6px; padding: 1.5rem; margin-bottom: 1.5rem;">
            <h3 style="margin-top: 0;">Sensors</h3>
            {body}
        </section>"#
        )
    } else {
        String::new()
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>GreenGrow Dashboard</title>
    <script>
        function refreshData() {{
            fetch('/api/state')
                .then(r => r.json())
                .then(data => {{
                    const list = document.getElementById('sensor-list');
                    if (list && data.sensors.length > 0) {{
                        list.innerHTML = data.sensors.map(s => {{
                            const reading = s.latest_reading
                                ? `<span style="font-weight: 600; color: ${{s.latest_reading.value > 1000 && s.type === 'CO2' ? '#dc3545' : '#28a745'}};">${{s.latest_reading.value}} ${{s.unit}}</span>`
                                : '<span style="color: #6c757d;">No data yet</span>';
                            const updated = s.latest_reading
                                ? `<p style="font-size: 0.75rem; color: #6c757d; margin: 0.25rem 0 0;">Last updated: ${{new Date(s.latest_reading.timestamp).toLocaleString()}}</p>`
                                : '';
                            return `<li style="border: 1px solid #dee2e6; border-radius: 6px; background: #f8f9fa; padding: 1rem; margin-bottom: 1rem;">
                                <div style="display: flex; justify-content: space-between;">
                                    <strong>${{s.display_name}}:</strong>${{reading}}
                                </div>
                                <p style="font-size: 0.85rem; color: #6c757d; margin: 0.25rem 0 0;">${{s.description || 'No description'}}</p>
                                ${{updated}}
                            </li>`;
                        }}).join('');
                    }}
                    const error = document.getElementById('error-line');
                    if (error) {{
                        error.textContent = data.error ? 'Error: ' + data.error : '';
                    }}
                }});
        }}
        setInterval(refreshData, 5000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; background: #f1f3f5; margin: 0;">
    <div style="display: flex; min-height: 100vh;">
        <aside style="background: #e9ecef; width: 16rem; padding: 1.5rem;">
            <div style="font-size: 1.5rem; font-weight: 700; color: #28a745; margin-bottom: 2rem;">&#127793; GreenGrow</div>
            <h3 style="color: #495057;">Greenhouses</h3>
            <form method="post" action="/api/select">
                <select name="greenhouse_id" onchange="this.form.submit()" style="width: 100%; padding: 0.4rem;">
                    <option value="">Select Greenhouse</option>
                    {options}
                </select>
            </form>
        </aside>
        <main style="flex: 1; padding: 1.5rem;">
            <header style="background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,.15); padding: 1rem; display: flex; justify-content: flex-end; margin-bottom: 1.5rem;">
                <div title="{username}" style="width: 2rem; height: 2rem; border-radius: 50%; background: #adb5bd; color: #fff; font-weight: 600; display: flex; align-items: center; justify-content: center;">{initial}</div>
            </header>
            <h2>Dashboard Overview</h2>
            <p id="error-line" style="color: #dc3545;"></p>
            {status_line}
            {greenhouse_card}
            {sensors_card}
            {overview_section}
        </main>
    </div>
</body>
</html>"#,
        username = user.display_name(),
        initial = initial,
        options = options,
        status_line = status_line,
        greenhouse_card = greenhouse_card,
        sensors_card = sensors_card,
        overview_section = overview_section,
    );

    Html(html).into_response()
}

fn sensor_item(sensor: &Sensor) -> String {
    let reading = match &sensor.latest_reading {
        Some(reading) => {
            let color = if sensor.sensor_type == "CO2" && reading.value > 1000.0 {
                "#dc3545"
            } else {
                "#28a745"
            };
            format!(
                r#"<span style="font-weight: 600; color: {};">{} {}</span>"#,
                color,
                reading.value,
                sensor.unit()
            )
        }
        None => r#"<span style="color: #6c757d;">No data yet</span>"#.to_string(),
    };

    let updated = match &sensor.latest_reading {
        Some(reading) => format!(
            r#"<p style="font-size: 0.75rem; color: #6c757d; margin: 0.25rem 0 0;">Last updated: {}</p>"#,
            reading.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => String::new(),
    };

    format!(
        r#"<li style="border: 1px solid #dee2e6; border-radius: 6px; background: #f8f9fa; padding: 1rem; margin-bottom: 1rem;">
            <div style="display: flex; justify-content: space-between;">
                <strong>{}:</strong>{}
            </div>
            <p style="font-size: 0.85rem; color: #6c757d; margin: 0.25rem 0 0;">{}</p>
            {}
        </li>"#,
        sensor.display_name(),
        reading,
        sensor.description.as_deref().unwrap_or("No description"),
        updated,
    )
}

fn actuator_status(actuator: &Actuator) -> String {
    match &actuator.latest_status {
        Some(status) => match status.status_value.to_lowercase().as_str() {
            "on" => r#"<span style="padding: 0.25em 0.75em; background: #28a745; color: #fff; border-radius: 999px; font-size: 0.85em;">On</span>"#.to_string(),
            "off" => r#"<span style="padding: 0.25em 0.75em; background: #adb5bd; color: #fff; border-radius: 999px; font-size: 0.85em;">Off</span>"#.to_string(),
            _ => format!(r#"<span style="font-size: 0.85em;">{}</span>"#, status.status_value),
        },
        None => r#"<span style="color: #6c757d; font-size: 0.85em;">No status yet</span>"#.to_string(),
    }
}

fn actuators_card(overview: &Overview) -> String {
    let body = if overview.actuators.is_empty() {
        r#"<p style="color: #6c757d;">No actuators found for this greenhouse.</p>"#.to_string()
    } else {
        let rows: String = overview
            .actuators
            .iter()
            .map(|a| {
                format!(
                    r#"<li style="display: flex; justify-content: space-between; margin-bottom: 0.5rem;">
                        <span style="font-weight: 600;">{}:</span>{}
                    </li>"#,
                    a.display_name(),
                    actuator_status(a),
                )
            })
            .collect();
        format!(r#"<ul style="list-style: none; padding: 0;">{rows}</ul>"#)
    };

    format!(
        r#"<section style="background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,.15); border-radius: 6px; padding: 1.5rem; margin-bottom: 1.5rem;">
        <h3 style="margin-top: 0;">Actuators Status</h3>
        {body}
    </section>"#
    )
}

fn alerts_card(alerts: &[String]) -> String {
    if alerts.is_empty() {
        return String::new();
    }

    let items: String = alerts
        .iter()
        .map(|alert| format!(r#"<li style="color: #721c24; margin-bottom: 0.5rem;">&#9888; {alert}</li>"#))
        .collect();

    format!(
        r#"<section style="background: #fff; border: 1px solid #dc3545; box-shadow: 0 1px 3px rgba(0,0,0,.15); border-radius: 6px; padding: 1.5rem; margin-bottom: 1.5rem;">
        <h3 style="margin-top: 0; color: #721c24;">Active Alerts</h3>
        <ul style="list-style: none; padding: 0;">{items}</ul>
    </section>"#
    )
}

async fn state_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let sensors: Vec<serde_json::Value> = state
        .sensors
        .iter()
        .map(|s| {
            serde_json::json!({
                "id": s.id,
                "name": s.name,
                "display_name": s.display_name(),
                "type": s.sensor_type,
                "unit": s.unit(),
                "description": s.description,
                "latest_reading": s.latest_reading,
            })
        })
        .collect();

    axum::Json(serde_json::json!({
        "user": state.user.as_ref().map(|u| serde_json::json!({
            "username": u.display_name(),
        })),
        "greenhouses": state.greenhouses,
        "selected": state.selected,
        "greenhouse": state.greenhouse,
        "sensors": sensors,
        "loading": state.loading,
        "error": state.error,
        "overview": state.overview,
        "overview_error": state.overview_error,
        "last_poll_epoch_ms": state.last_poll_epoch_ms,
    }))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::BackendClient;
    use crate::io::MockHttpClient;
    use crate::models::{Greenhouse, LatestStatus};
    use crate::nav::StateNavigator;
    use crate::state::{new_state_handle, StateHandle};
    use gg_auth::{Claims, SessionStore};

    /// A store with no tokens, so `select` never reaches the network
    struct EmptySessionStore;

    impl SessionStore for EmptySessionStore {
        fn access_token(&self) -> Option<String> {
            None
        }

        fn refresh_token(&self) -> Option<String> {
            None
        }

        fn save(&self, _access_token: &str, _refresh_token: Option<&str>) -> gg_auth::Result<()> {
            Ok(())
        }

        fn clear(&self) {}
    }

    fn test_app(state: StateHandle) -> Router {
        let api = Arc::new(BackendClient::new(
            "http://localhost:8000",
            Arc::new(MockHttpClient::new()),
        ));
        let poller = Arc::new(Poller::new(
            api,
            Arc::new(EmptySessionStore),
            Arc::new(StateNavigator::new(Arc::clone(&state))),
            Arc::clone(&state),
            Duration::from_secs(5),
        ));
        build_router(state, poller)
    }

    async fn signed_in_state() -> StateHandle {
        let state = new_state_handle();
        {
            let mut s = state.write().await;
            s.user = Some(Claims {
                username: Some("alice".to_string()),
                user_id: None,
                exp: None,
            });
            s.greenhouses = vec![Greenhouse {
                id: 1,
                name: Some("North wing".to_string()),
                location: Some("Back field".to_string()),
            }];
        }
        state
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = test_app(new_state_handle());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn index_redirects_to_login_without_session() {
        let app = test_app(new_state_handle());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn login_page_renders() {
        let app = test_app(new_state_handle());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("No active session"));
    }

    #[tokio::test]
    async fn index_renders_selector_and_user_badge() {
        let state = signed_in_state().await;
        let app = test_app(state);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("North wing"));
        assert!(html.contains(">A</div>"), "profile badge shows the initial");
        assert!(html.contains("Please select a greenhouse"));
    }

    #[tokio::test]
    async fn index_renders_actuators_and_alerts() {
        let state = signed_in_state().await;
        {
            let mut s = state.write().await;
            s.selected = Some(1);
            s.overview = Some(Overview {
                name: Some("North wing".to_string()),
                location: Some("Back field".to_string()),
                actuators: vec![
                    Actuator {
                        id: 1,
                        name: Some("Fan".to_string()),
                        actuator_type: "FAN".to_string(),
                        latest_status: Some(LatestStatus {
                            status_value: "ON".to_string(),
                            timestamp: None,
                        }),
                    },
                    Actuator {
                        id: 2,
                        name: None,
                        actuator_type: "VALVE".to_string(),
                        latest_status: Some(LatestStatus {
                            status_value: "42%".to_string(),
                            timestamp: None,
                        }),
                    },
                ],
                alerts: vec!["CO2 above threshold".to_string()],
            });
        }

        let app = test_app(state);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(">On</span>"), "on/off statuses become badges");
        assert!(html.contains("42%"), "other statuses render verbatim");
        assert!(html.contains("Active Alerts"));
        assert!(html.contains("CO2 above threshold"));
    }

    #[tokio::test]
    async fn state_endpoint_returns_snapshot() {
        let state = signed_in_state().await;
        let app = test_app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/state")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["user"]["username"], "alice");
        assert_eq!(json["greenhouses"][0]["name"], "North wing");
        assert_eq!(json["selected"], serde_json::Value::Null);
        assert!(json["sensors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn select_with_empty_id_redirects_home() {
        let state = signed_in_state().await;
        let app = test_app(Arc::clone(&state));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/select")
                    .header(
                        header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(Body::from("greenhouse_id="))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(state.read().await.selected, None);
    }

    #[tokio::test]
    async fn select_with_malformed_id_is_treated_as_empty() {
        let state = signed_in_state().await;
        let app = test_app(Arc::clone(&state));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/select")
                    .header(
                        header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(Body::from("greenhouse_id=not-a-number"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.read().await.selected, None);
    }
}
