use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

/// Caller role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    /// Representative of one company (see `company_id`)
    Company,
    Admin,
}

/// Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
}

/// Authenticated caller, extracted from a validated bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
    pub company_id: Option<String>,
    pub name: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the caller speaks for `company_id`. Admins speak for every company.
    pub fn represents(&self, company_id: &str) -> bool {
        self.is_admin()
            || (self.role == Role::Company && self.company_id.as_deref() == Some(company_id))
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "Anonymous".to_string())
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            company_id: claims.company_id,
            name: claims.name,
        }
    }
}

/// Sign claims with an HS256 secret. Used by tooling and tests; tokens in
/// production come from the identity provider.
pub fn encode_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate an HS256 token and return its claims.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// 401 in the services' JSON error shape.
fn unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let body = json!({
        "error": message,
        "code": "UNAUTHORIZED",
        "status": 401,
    });
    req.into_response(HttpResponse::Unauthorized().json(body))
}

/// JWT Authentication Middleware
///
/// Requests without an `Authorization` header pass through anonymously;
/// handlers that need a caller ask for the [`AuthUser`] extractor. A header
/// that is present but invalid is answered with a JSON 401.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    secret: Arc<str>,
}

impl JwtAuthMiddleware {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    secret: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let secret = self.secret.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .map(|value| value.to_str().ok().map(str::to_owned));
            let header = match header {
                Some(header) => header,
                None => {
                    return service.call(req).await.map(ServiceResponse::map_into_boxed_body)
                }
            };

            let token = match header.as_deref().and_then(|h| h.strip_prefix("Bearer ")) {
                Some(token) => token.to_owned(),
                None => return Ok(unauthorized(req, "Invalid Authorization header format")),
            };

            let claims = match decode_token(&secret, &token) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::warn!("JWT validation failed: {}", e);
                    return Ok(unauthorized(req, &format!("Invalid token: {}", e)));
                }
            };

            if claims.role == Role::Company && claims.company_id.is_none() {
                tracing::warn!(sub = %claims.sub, "Company token without company_id");
                return Ok(unauthorized(
                    req,
                    "Invalid token: company role requires company_id",
                ));
            }

            req.extensions_mut().insert(AuthUser::from(claims));

            service.call(req).await.map(ServiceResponse::map_into_boxed_body)
        })
    }
}

/// FromRequest implementation for AuthUser
impl actix_web::FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            ))),
        }
    }
}
