use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::services::ProfileService;

/// `GET /api/v1/profiles/{username}`
pub async fn get_profile(
    service: web::Data<ProfileService>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let user = service.get_user_by_username(&username).await?;
    Ok(HttpResponse::Ok().json(user))
}
