//! Caller identity from request headers.

use axum::http::HeaderMap;
use db::TenantContext;
use uuid::Uuid;

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Build the tenant scope for a request.  A missing or malformed
/// `x-tenant-id` is rejected before any store call.
pub fn tenant_from_headers(headers: &HeaderMap) -> Result<TenantContext, ApiError> {
    let tenant_id = headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or(ApiError::MissingTenant)?;

    let tenant = TenantContext::new(tenant_id);
    let email = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    Ok(match email {
        Some(email) => tenant.with_user(email),
        None => tenant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_tenant_and_email() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("ops@example.com"));

        let tenant = tenant_from_headers(&headers).unwrap();
        assert_eq!(tenant.tenant_id, id);
        assert_eq!(tenant.user_email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn rejects_missing_or_garbled_tenant() {
        assert!(matches!(tenant_from_headers(&HeaderMap::new()), Err(ApiError::MissingTenant)));

        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(tenant_from_headers(&headers), Err(ApiError::MissingTenant)));
    }
}
