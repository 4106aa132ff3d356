//! Authentication middleware
//!
//! Resolves the bearer token to an `Actor` once per request. Handlers and
//! services receive the resolved actor and never re-derive identity from
//! headers or the token store.

use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{ErrorDetail, ErrorResponse};
use crate::token_store::Principal;
use crate::AppState;

/// The authenticated caller, resolved once at the edge
///
/// Managers carry the full set of shops they manage so scoping checks are
/// plain set lookups; workers are pinned to exactly one shop.
#[derive(Clone, Debug)]
pub enum Actor {
    Manager {
        user_id: Uuid,
        is_admin: bool,
        shop_ids: HashSet<Uuid>,
    },
    Worker {
        worker_id: Uuid,
        shop_id: Uuid,
    },
}

impl Actor {
    /// Whether this actor may write ledger entries for the given shop
    pub fn can_record_for(&self, shop_id: Uuid) -> bool {
        match self {
            Actor::Manager {
                is_admin, shop_ids, ..
            } => *is_admin || shop_ids.contains(&shop_id),
            Actor::Worker {
                shop_id: own_shop, ..
            } => *own_shop == shop_id,
        }
    }

    /// Whether this actor may administer the given shop (workers, invites,
    /// product review)
    pub fn can_manage(&self, shop_id: Uuid) -> bool {
        match self {
            Actor::Manager {
                is_admin, shop_ids, ..
            } => *is_admin || shop_ids.contains(&shop_id),
            Actor::Worker { .. } => false,
        }
    }

    /// Shops whose data this actor may read; `None` means unrestricted
    /// (admin)
    pub fn visible_shops(&self) -> Option<Vec<Uuid>> {
        match self {
            Actor::Manager { is_admin: true, .. } => None,
            Actor::Manager { shop_ids, .. } => Some(shop_ids.iter().copied().collect()),
            Actor::Worker { shop_id, .. } => Some(vec![*shop_id]),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Manager { is_admin: true, .. })
    }

    /// Worker id to attribute a ledger entry to, if the caller is a worker
    pub fn worker_id(&self) -> Option<Uuid> {
        match self {
            Actor::Worker { worker_id, .. } => Some(*worker_id),
            Actor::Manager { .. } => None,
        }
    }
}

/// Authentication middleware that resolves bearer tokens to actors
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let principal = match state.tokens.get(token) {
        Some(principal) => principal,
        None => return unauthorized_response("Invalid or expired token"),
    };

    let actor = match principal {
        Principal::Manager { user_id } => {
            let is_admin = match sqlx::query_scalar::<_, bool>(
                "SELECT is_admin FROM users WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&state.db)
            .await
            {
                Ok(Some(is_admin)) => is_admin,
                Ok(None) => return unauthorized_response("Account no longer exists"),
                Err(e) => {
                    tracing::error!("Failed to resolve actor: {}", e);
                    return internal_response();
                }
            };

            let shop_ids = match sqlx::query_scalar::<_, Uuid>(
                "SELECT shop_id FROM shop_managers WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_all(&state.db)
            .await
            {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    tracing::error!("Failed to resolve managed shops: {}", e);
                    return internal_response();
                }
            };

            Actor::Manager {
                user_id,
                is_admin,
                shop_ids,
            }
        }
        Principal::Worker { worker_id, shop_id } => Actor::Worker { worker_id, shop_id },
    };

    request.extensions_mut().insert(actor);

    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message_en: message.to_string(),
            message_sw: "Hujaruhusiwa".to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

fn internal_response() -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "INTERNAL_ERROR".to_string(),
            message_en: "An internal server error occurred".to_string(),
            message_sw: "Hitilafu ya ndani ya seva imetokea".to_string(),
            field: None,
        },
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}

/// Extractor for the authenticated actor
/// Use this in handlers behind `auth_middleware`
#[derive(Clone, Debug)]
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(CurrentActor)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message_en: "Authentication required".to_string(),
                        message_sw: "Unahitaji kuingia kwanza".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(is_admin: bool, shops: &[Uuid]) -> Actor {
        Actor::Manager {
            user_id: Uuid::new_v4(),
            is_admin,
            shop_ids: shops.iter().copied().collect(),
        }
    }

    #[test]
    fn test_manager_scoping() {
        let shop_a = Uuid::new_v4();
        let shop_b = Uuid::new_v4();
        let actor = manager(false, &[shop_a]);

        assert!(actor.can_record_for(shop_a));
        assert!(actor.can_manage(shop_a));
        assert!(!actor.can_record_for(shop_b));
        assert!(!actor.can_manage(shop_b));
        assert_eq!(actor.visible_shops(), Some(vec![shop_a]));
    }

    #[test]
    fn test_admin_sees_everything() {
        let shop = Uuid::new_v4();
        let actor = manager(true, &[]);

        assert!(actor.can_record_for(shop));
        assert!(actor.can_manage(shop));
        assert_eq!(actor.visible_shops(), None);
        assert!(actor.is_admin());
    }

    #[test]
    fn test_worker_pinned_to_own_shop() {
        let own_shop = Uuid::new_v4();
        let other_shop = Uuid::new_v4();
        let worker_id = Uuid::new_v4();
        let actor = Actor::Worker {
            worker_id,
            shop_id: own_shop,
        };

        assert!(actor.can_record_for(own_shop));
        assert!(!actor.can_record_for(other_shop));
        assert!(!actor.can_manage(own_shop));
        assert_eq!(actor.visible_shops(), Some(vec![own_shop]));
        assert_eq!(actor.worker_id(), Some(worker_id));
    }
}
