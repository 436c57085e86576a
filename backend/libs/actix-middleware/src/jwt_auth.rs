//! Session-token identity middleware.
//!
//! Validates `Authorization: Bearer <jwt>` issued by the identity provider
//! and stores the caller's [`UserId`] (the token `sub`) in request
//! extensions. Requests without a usable token continue anonymously; routes
//! that need an identity extract [`UserId`] and fail with 401 when absent.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::Arc;

/// Authenticated caller identity (identity-provider user id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Claims read from session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    /// Session id, present on provider-issued session tokens
    #[serde(default)]
    pub sid: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("invalid verification key: {0}")]
    InvalidKey(String),
    #[error("token validation failed: {0}")]
    Validation(String),
    #[error("token has an empty subject")]
    EmptySubject,
}

/// Verifies session tokens.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// RS256 validator from the provider's PEM-encoded public key.
    pub fn rs256_from_pem(public_key_pem: &str, issuer: Option<&str>) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Shared-secret validator for local development and tests.
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| JwtError::Validation(e.to_string()))?;

        if data.claims.sub.trim().is_empty() {
            return Err(JwtError::EmptySubject);
        }

        Ok(data.claims)
    }
}

/// Identity middleware; `None` validator means every request is anonymous.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    validator: Option<Arc<JwtValidator>>,
}

impl JwtAuthMiddleware {
    pub fn new(validator: Arc<JwtValidator>) -> Self {
        Self {
            validator: Some(validator),
        }
    }

    pub fn disabled() -> Self {
        Self { validator: None }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    validator: Option<Arc<JwtValidator>>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if let Some(validator) = &self.validator {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            if let Some(token) = token {
                match validator.validate(token) {
                    Ok(claims) => {
                        req.extensions_mut().insert(UserId(claims.sub));
                    }
                    Err(e) => {
                        tracing::debug!("Session token rejected, continuing anonymously: {}", e);
                    }
                }
            }
        }

        Box::pin(async move { service.call(req).await })
    }
}

impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(user_id.clone())),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            ))),
        }
    }
}
