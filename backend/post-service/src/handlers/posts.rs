/// Post handlers - HTTP endpoints for post procedures
use actix_web::{web, HttpResponse};
use actix_middleware::UserId;

use crate::error::Result;
use crate::services::PostService;
use crate::validation::CreatePostInput;

/// `GET /api/v1/posts`
pub async fn get_all_posts(service: web::Data<PostService>) -> Result<HttpResponse> {
    let posts = service.get_all().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// `GET /api/v1/posts/{post_id}`
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post = service.get_single_post_by_id(&post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// `GET /api/v1/users/{user_id}/posts`
pub async fn get_user_posts(
    service: web::Data<PostService>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = service.get_posts_by_user_id(&user_id).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// `POST /api/v1/posts`
///
/// Anonymous callers reach the procedure too; it answers UNAUTHORIZED once
/// the body has been validated.
pub async fn create_post(
    service: web::Data<PostService>,
    user_id: Option<UserId>,
    body: web::Json<CreatePostInput>,
) -> Result<HttpResponse> {
    let caller = user_id.as_ref().map(UserId::as_str);
    let post = service.create(caller, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}
