use crate::config::ServerConfig;
use crate::error::Result;
use crate::build_state;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use futures::FutureExt;
use tower::Layer as _;
use tower_http::{normalize_path::NormalizePathLayer, trace::TraceLayer};
use tracing::{debug, info};
use yamdb_app::{
    auth::{auth_router, token::TokenLayer},
    rest_api,
    state::AppState,
    user::users_router,
};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state).layer(TraceLayer::new_for_http());

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    // Trailing slash is optional on all paths
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        axum::ServiceExt::<Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    debug!("Server stopped");
    Ok(())
}

#[cfg(feature = "openapi")]
fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::openapi::Components;

    #[derive(utoipa::OpenApi)]
    #[openapi(modifiers(&SecurityAddon), security(("bearer" = [])))]
    struct OpenApi;

    struct SecurityAddon;

    impl utoipa::Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            openapi
                .components
                .get_or_insert_with(Components::new)
                .add_security_scheme(
                    "bearer",
                    SecurityScheme::Http(
                        HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build(),
                    ),
                );
        }
    }

    use utoipa::OpenApi as _;
    OpenApi::openapi()
        .nest("/v1/auth", yamdb_app::auth::api_docs())
        .nest("/v1/users", yamdb_app::user::api_docs())
        .nest("/v1/categories", rest_api::category::api_docs())
        .nest("/v1/genres", rest_api::genre::api_docs())
        .nest("/v1/titles", rest_api::title::api_docs())
        .nest("/v1/titles/{title_id}/reviews", rest_api::review::api_docs())
        .nest(
            "/v1/titles/{title_id}/reviews/{review_id}/comments",
            rest_api::comment::api_docs(),
        )
}

fn api_router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/users", users_router())
        .nest("/categories", rest_api::category::router())
        .nest("/genres", rest_api::genre::router())
        .nest("/titles", rest_api::title::router())
        .nest("/auth", auth_router())
        // Bearer token is optional, handlers and role layers decide about access
        .layer(TokenLayer::new(state.clone()))
        .with_state(state)
}

pub fn main_router(state: AppState) -> Router<()> {
    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/v1", api_router(state))
        .route("/health", get(health));

    #[cfg(feature = "openapi")]
    {
        let docs = api_docs();
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs),
        );
    }
    router
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
