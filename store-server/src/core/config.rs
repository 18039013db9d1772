use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 服务器配置 - 店面节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | CONCH_WORK_DIR | /var/lib/conch/store | 工作目录 |
/// | HTTP_PORT | 8088 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_DIR | work_dir/logs | 日志目录覆盖 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// CONCH_WORK_DIR=/data/conch HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志目录覆盖 (默认 work_dir/logs)
    pub log_dir: Option<String>,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("CONCH_WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/conch/store".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8088),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录: LOG_DIR 或 work_dir/logs
    pub fn log_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(&self.work_dir).join("logs"),
        }
    }

    /// 确保工作目录结构存在
    ///
    /// 创建 work_dir 及其子目录 (database/, logs/)
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides() {
        let config = Config::with_overrides("/tmp/conch-test", 9090);
        assert_eq!(config.work_dir, "/tmp/conch-test");
        assert_eq!(config.http_port, 9090);
    }

    #[test]
    fn test_directory_layout() {
        let mut config = Config::with_overrides("/tmp/conch-test", 9090);
        config.log_dir = None;
        assert_eq!(
            config.database_dir(),
            PathBuf::from("/tmp/conch-test/database")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/conch-test/logs"));

        config.log_dir = Some("/var/log/conch".to_string());
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/conch"));
    }
}
