//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::security_log;
use shared::AppError;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展 (`req.extensions_mut().insert(user)`)。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/auth/login`, `/api/auth/register`
/// - `GET /api/products` 与 `GET /api/products/{id}` (公开商品目录)
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 Unauthorized |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 InvalidToken |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // 公共 API 路由跳过认证
    if is_public_api_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    // 验证令牌
    match jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 判断是否公共 API 路由
///
/// 登录、注册、健康检查始终公开；商品目录仅 GET 公开，写操作仍需认证。
fn is_public_api_route(method: &http::Method, path: &str) -> bool {
    if path == "/api/auth/login" || path == "/api/auth/register" {
        return true;
    }

    if path == "/api/health" || path.starts_with("/api/health/") {
        return true;
    }

    if method == http::Method::GET
        && (path == "/api/products" || path.starts_with("/api/products/"))
    {
        return true;
    }

    false
}

/// 管理员中间件 - 要求管理员
///
/// 检查 `CurrentUser.is_admin`
///
/// # 错误
///
/// 非管理员返回 403 Forbidden
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_admin {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.clone(),
            name = user.name.clone()
        );
        return Err(AppError::new(shared::ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 从请求扩展中获取 CurrentUser
    ///
    /// # 错误
    ///
    /// 未认证返回 401 Unauthorized
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or(AppError::unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_route_table() {
        let get = http::Method::GET;
        let post = http::Method::POST;

        assert!(is_public_api_route(&post, "/api/auth/login"));
        assert!(is_public_api_route(&post, "/api/auth/register"));
        assert!(is_public_api_route(&get, "/api/health"));
        assert!(is_public_api_route(&get, "/api/health/detailed"));
        assert!(is_public_api_route(&get, "/api/products"));
        assert!(is_public_api_route(&get, "/api/products/product:p1"));

        // Catalog writes stay protected
        assert!(!is_public_api_route(&post, "/api/products"));
        assert!(!is_public_api_route(&post, "/api/products/product:p1/reviews"));

        // Everything else stays protected
        assert!(!is_public_api_route(&get, "/api/cart"));
        assert!(!is_public_api_route(&get, "/api/orders"));
        assert!(!is_public_api_route(&get, "/api/auth/me"));
    }
}
