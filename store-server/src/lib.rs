//! Conch Store Server - 自托管网店后端
//!
//! # 架构概述
//!
//! 本模块是 Store Server 的主入口，提供以下核心功能：
//!
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **订单域** (`orders`): 金额计算与状态机
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、每用户写锁、服务器
//! ├── auth/          # JWT 认证、权限
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单金额与生命周期
//! ├── utils/         # 错误与日志
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 初始化运行环境 (dotenv + 日志)
///
/// 生产环境写入按天滚动的日志文件, 开发环境只输出到终端。
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    if config.is_production() {
        config.ensure_work_dir_structure()?;
        init_logger_with_file(config.log_dir().to_str());
    } else {
        init_logger();
    }

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______                 __
  / ____/___  ____  _____/ /_
 / /   / __ \/ __ \/ ___/ __ \
/ /___/ /_/ / / / / /__/ / / /
\____/\____/_/ /_/\___/_/ /_/
    _____ __
   / ___// /_____  ________
   \__ \/ __/ __ \/ ___/ _ \
  ___/ / /_/ /_/ / /  /  __/
 /____/\__/\____/_/   \___/
    "#
    );
}
