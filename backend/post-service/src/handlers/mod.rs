/// HTTP handlers, one route per procedure
///
/// - Posts: global feed, single post, per-author feed, create
/// - Profiles: lookup by username
/// - Health: liveness and readiness probes
pub mod health;
pub mod posts;
pub mod profile;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::error::AppError;

pub use health::{health_summary, liveness_check, readiness_summary, HealthState};
pub use posts::{create_post, get_all_posts, get_post, get_user_posts};
pub use profile::get_profile;

/// Malformed or mistyped JSON bodies become BAD_REQUEST in the error envelope.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(json_error_handler)
}

/// Unmatched routes answer with the NOT_FOUND envelope.
pub async fn route_not_found() -> Result<actix_web::HttpResponse, AppError> {
    Err(AppError::NotFound("Route not found".to_string()))
}

/// Procedure routes under `/api/v1`.
///
/// Expects `web::Data<PostService>` and `web::Data<ProfileService>` in app
/// data, and an upstream `JwtAuthMiddleware` for caller identity.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(json_config())
            .service(
                web::resource("/posts")
                    .route(web::get().to(get_all_posts))
                    .route(web::post().to(create_post)),
            )
            .service(web::resource("/posts/{post_id}").route(web::get().to(get_post)))
            .service(web::resource("/users/{user_id}/posts").route(web::get().to(get_user_posts)))
            .service(web::resource("/profiles/{username}").route(web::get().to(get_profile))),
    );
}
