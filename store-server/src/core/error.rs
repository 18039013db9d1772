use thiserror::Error;

/// 服务器启动过程中的错误
///
/// 请求处理使用 [`shared::AppError`]，这里只覆盖启动和监听阶段。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

/// 启动阶段的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
