//! 统一错误处理
//!
//! 服务端错误类型直接使用 [`shared::AppError`]，保证客户端收到的
//! 错误码与 shared crate 中的定义一致。
//!
//! 这里补充仓储层错误到应用错误的默认转换；各 handler 对本资源
//! 特有的错误码（如 `CartItemNotFound`）做精确映射后，剩余情况
//! 走这个兜底转换。

use crate::db::repository::RepoError;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => AppError::with_message(ErrorCode::ValidationFailed, msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_mapping() {
        let e: AppError = RepoError::NotFound("Address address:a1 not found".into()).into();
        assert_eq!(e.code, ErrorCode::NotFound);

        let e: AppError = RepoError::Duplicate("Email taken".into()).into();
        assert_eq!(e.code, ErrorCode::AlreadyExists);

        let e: AppError = RepoError::Validation("Quantity must be at least 1".into()).into();
        assert_eq!(e.code, ErrorCode::ValidationFailed);

        let e: AppError = RepoError::Database("boom".into()).into();
        assert_eq!(e.code, ErrorCode::DatabaseError);
    }
}
