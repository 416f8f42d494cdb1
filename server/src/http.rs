use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::{self, HeaderName, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
};
use platform_authn::Authenticator;
use platform_db::{DbPool, SeaOrmStore};
use products_hotels::{CatalogReader, EligibilityChecker};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{config::AppConfig, hotels};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub authenticator: Authenticator,
    pub eligibility: EligibilityChecker,
    pub catalog: CatalogReader,
}

impl AppState {
    pub fn new(pool: DbPool, config: Arc<AppConfig>) -> Self {
        let store = Arc::new(SeaOrmStore::new(pool.clone()));
        let authenticator = Authenticator::new(Arc::new(config.auth.clone()), store.clone());
        Self {
            pool,
            config,
            authenticator,
            eligibility: EligibilityChecker::new(store.clone()),
            catalog: CatalogReader::new(store),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(addr = %config.addr, "hotel gateway listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_methods([Method::GET])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/hotels", get(hotels::list_hotels))
        .route("/hotels/{hotel_id}", get(hotels::show_hotel_rooms))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.pool.get_database_backend();
    let db_ok = state
        .pool
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{insert_enrollment, insert_hotel, insert_ticket, insert_user, open_session};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use entity::tickets::Status;
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use platform_authn::{AuthConfig, issue_token};
    use sea_orm::Database;
    use serde_json::Value;
    use tower::ServiceExt;

    struct TestApp {
        pool: DbPool,
        config: Arc<AppConfig>,
    }

    impl TestApp {
        async fn new() -> Self {
            let pool = Database::connect("sqlite::memory:").await.unwrap();
            Migrator::up(&pool, None).await.unwrap();
            let config = Arc::new(AppConfig {
                auth: AuthConfig {
                    jwt_secret: "test-secret".into(),
                    session_ttl_minutes: 30,
                },
                cors_allowed_origins: vec!["http://localhost:5173".into()],
            });
            Self { pool, config }
        }

        fn router(&self) -> Router {
            build_router(AppState::new(self.pool.clone(), self.config.clone()))
        }

        /// Creates a user with a live session and returns its id and token.
        async fn signed_in_user(&self, email: &str) -> (i32, String) {
            let user = insert_user(&self.pool, email).await.unwrap();
            let token = open_session(&self.pool, user.id, &self.config.auth)
                .await
                .unwrap();
            (user.id, token)
        }

        /// A signed-in user holding a ticket of the given kind.
        async fn ticket_holder(
            &self,
            email: &str,
            cpf: &str,
            includes_hotel: bool,
            is_remote: bool,
            status: Status,
        ) -> String {
            let (user_id, token) = self.signed_in_user(email).await;
            let enrollment = insert_enrollment(&self.pool, user_id, cpf).await.unwrap();
            insert_ticket(&self.pool, enrollment.id, includes_hotel, is_remote, status)
                .await
                .unwrap();
            token
        }

        async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Vec<u8>) {
            let mut request = Request::builder().uri(uri);
            if let Some(token) = token {
                request = request.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let response = self
                .router()
                .oneshot(request.body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let body = response.into_body().collect().await.unwrap().to_bytes();
            (status, body.to_vec())
        }
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_database_state() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/health", None).await;

        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["ok"], Value::Bool(true));
        assert_eq!(body["dbOk"], Value::Bool(true));
    }

    #[tokio::test]
    async fn requests_without_valid_session_are_unauthorized() {
        let app = TestApp::new().await;
        let (user_id, saved) = app.signed_in_user("nosession@test.dev").await;
        let enrollment = insert_enrollment(&app.pool, user_id, "10101010101").await.unwrap();
        insert_ticket(&app.pool, enrollment.id, true, false, Status::Paid)
            .await
            .unwrap();
        insert_hotel(&app.pool, "Only", &[("1", 1)]).await.unwrap();
        let unsaved = issue_token(user_id, &app.config.auth).unwrap();
        assert_ne!(unsaved, saved);

        let (status, _) = app.get("/hotels", Some(&saved)).await;
        assert_eq!(status, StatusCode::OK);

        for uri in ["/hotels", "/hotels/1"] {
            let (status, body) = app.get(uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} without token");
            assert!(body.is_empty());

            let (status, _) = app.get(uri, Some("not-a-token")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} with garbage token");

            let (status, _) = app.get(uri, Some(&unsaved)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} without session");
        }
    }

    #[tokio::test]
    async fn user_without_enrollment_is_unauthorized() {
        let app = TestApp::new().await;
        let (_, token) = app.signed_in_user("u1@test.dev").await;

        for uri in ["/hotels", "/hotels/1"] {
            let (status, _) = app.get(uri, Some(&token)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn enrollment_without_ticket_is_not_found() {
        let app = TestApp::new().await;
        let (user_id, token) = app.signed_in_user("noticket@test.dev").await;
        insert_enrollment(&app.pool, user_id, "11111111111").await.unwrap();

        for uri in ["/hotels", "/hotels/10"] {
            let (status, _) = app.get(uri, Some(&token)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn ineligible_ticket_types_are_not_found() {
        let app = TestApp::new().await;
        let no_hotel = app
            .ticket_holder("nohotel@test.dev", "22222222222", false, false, Status::Reserved)
            .await;
        let remote = app
            .ticket_holder("remote@test.dev", "33333333333", true, true, Status::Paid)
            .await;

        for token in [no_hotel.as_str(), remote.as_str()] {
            for uri in ["/hotels", "/hotels/1"] {
                let (status, _) = app.get(uri, Some(token)).await;
                assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            }
        }
    }

    #[tokio::test]
    async fn reserved_ticket_requires_payment() {
        let app = TestApp::new().await;
        let token = app
            .ticket_holder("u2@test.dev", "44444444444", true, false, Status::Reserved)
            .await;
        insert_hotel(&app.pool, "Reserved Inn", &[("1", 2)]).await.unwrap();

        for uri in ["/hotels", "/hotels/1"] {
            let (status, body) = app.get(uri, Some(&token)).await;
            assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "{uri}");
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn paid_ticket_lists_hotels() {
        let app = TestApp::new().await;
        let token = app
            .ticket_holder("u3@test.dev", "55555555555", true, false, Status::Paid)
            .await;
        let hotel = insert_hotel(&app.pool, "Hotel One", &[]).await.unwrap();

        let (status, body) = app.get("/hotels", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        let hotels = json(&body);
        let hotels = hotels.as_array().unwrap();
        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0]["id"], Value::from(hotel.id));
        assert_eq!(hotels[0]["name"], Value::from("Hotel One"));
        for field in ["image", "createdAt", "updatedAt"] {
            assert!(hotels[0][field].is_string(), "{field}");
        }
    }

    #[tokio::test]
    async fn paid_ticket_with_no_hotels_gets_empty_list() {
        let app = TestApp::new().await;
        let token = app
            .ticket_holder("empty@test.dev", "66666666666", true, false, Status::Paid)
            .await;

        let (status, body) = app.get("/hotels", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), Value::Array(vec![]));
    }

    #[tokio::test]
    async fn hotel_rooms_are_nested_under_the_hotel() {
        let app = TestApp::new().await;
        let token = app
            .ticket_holder("rooms@test.dev", "77777777777", true, false, Status::Paid)
            .await;
        let other = insert_hotel(&app.pool, "Other", &[("X", 4)]).await.unwrap();
        let hotel = insert_hotel(&app.pool, "Seaside", &[("101", 2), ("102", 3)])
            .await
            .unwrap();

        let (status, body) = app.get(&format!("/hotels/{}", hotel.id), Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["id"], Value::from(hotel.id));
        assert_eq!(body["name"], Value::from("Seaside"));
        let rooms = body["Rooms"].as_array().unwrap();
        assert_eq!(rooms.len(), 2);
        for room in rooms {
            assert_eq!(room["hotelId"], Value::from(hotel.id));
            assert_ne!(room["hotelId"], Value::from(other.id));
            assert!(room["capacity"].is_number());
            assert!(room["createdAt"].is_string());
        }
    }

    #[tokio::test]
    async fn existing_hotel_without_rooms_returns_empty_rooms() {
        let app = TestApp::new().await;
        let token = app
            .ticket_holder("u4@test.dev", "88888888888", true, false, Status::Paid)
            .await;
        let hotel = insert_hotel(&app.pool, "Bare", &[]).await.unwrap();

        let (status, body) = app.get(&format!("/hotels/{}", hotel.id), Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["id"], Value::from(hotel.id));
        assert_eq!(body["Rooms"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn unknown_or_malformed_hotel_ids_are_not_found() {
        let app = TestApp::new().await;
        let token = app
            .ticket_holder("ids@test.dev", "99999999999", true, false, Status::Paid)
            .await;
        insert_hotel(&app.pool, "Only", &[("1", 1)]).await.unwrap();

        for uri in ["/hotels/abc", "/hotels/000", "/hotels/-1", "/hotels/424242"] {
            let (status, body) = app.get(uri, Some(&token)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn undecodable_hotel_id_follows_eligibility_then_not_found() {
        let app = TestApp::new().await;
        let paid = app
            .ticket_holder("utf8@test.dev", "12121212121", true, false, Status::Paid)
            .await;
        let (_, unenrolled) = app.signed_in_user("utf8-none@test.dev").await;

        let (status, body) = app.get("/hotels/%FF", Some(&paid)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());

        let (status, body) = app.get("/hotels/%FF", Some(&unenrolled)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = TestApp::new().await;

        let response = app
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}
