use std::path::PathBuf;
use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::{Config, UserLocks};
use crate::db::DbService;
use crate::db::models::UserCreate;
use crate::db::repository::UserRepository;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是店面节点的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | user_locks | Arc<UserLocks> | 用户级写锁 |
///
/// # 使用示例
///
/// ```ignore
/// // 获取数据库连接
/// let db = state.get_db();
///
/// // 串行化某个用户的写操作
/// let _guard = state.user_locks.acquire(&user.id).await;
/// ```
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 用户级写锁 (同一用户的写操作串行执行)
    pub user_locks: Arc<UserLocks>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`initialize()`](Self::initialize) 方法代替
    pub fn new(
        config: Config,
        db: Surreal<Db>,
        jwt_service: Arc<JwtService>,
        user_locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            config,
            db,
            jwt_service,
            user_locks,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/conch.db)
    /// 3. JWT 服务与用户锁
    /// 4. 管理员账户种子 (ADMIN_EMAIL / ADMIN_PASSWORD)
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        // 0. Ensure work_dir structure exists
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        // 1. Initialize DB
        // Use work_dir/database/conch.db for database path
        let db_dir = config.database_dir();
        let db_path = db_dir.join("conch.db");
        let db_path_str = db_path.to_string_lossy();

        let db_service = DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");
        let db = db_service.db;

        // 2. Initialize services
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let user_locks = Arc::new(UserLocks::new());

        let state = Self::new(config.clone(), db, jwt_service, user_locks);

        // 3. Seed admin account when configured
        state.seed_admin_account().await;

        state
    }

    /// 管理员账户种子
    ///
    /// 读取 ADMIN_EMAIL 和 ADMIN_PASSWORD 环境变量，
    /// 如果账户不存在则创建。两个变量缺一不可。
    async fn seed_admin_account(&self) {
        let (email, password) = match (
            std::env::var("ADMIN_EMAIL"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(e), Ok(p)) if !e.is_empty() && !p.is_empty() => (e, p),
            _ => return,
        };

        let repo = UserRepository::new(self.get_db());
        match repo.find_by_email(&email).await {
            Ok(Some(_)) => {
                tracing::debug!("Admin account already exists: {}", email);
            }
            Ok(None) => {
                let name =
                    std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
                match repo
                    .create(UserCreate {
                        name,
                        email: email.clone(),
                        password,
                        is_admin: true,
                    })
                    .await
                {
                    Ok(_) => tracing::info!("👤 Seeded admin account: {}", email),
                    Err(e) => tracing::error!("Failed to seed admin account: {}", e),
                }
            }
            Err(e) => {
                tracing::error!("Failed to check admin account: {}", e);
            }
        }
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
