//! Per-User Write Serialization
//!
//! 用户级写锁管理

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 用户写锁管理器
///
/// 使用 DashMap 为每个用户维护独立的异步互斥锁。
/// 同一用户的写操作串行执行，不同用户互不阻塞。
///
/// # 使用场景
///
/// 涉及"读取-判断-写入"的多步操作（如设置默认地址时先清除旧默认），
/// 必须在持有用户锁的情况下执行，避免并发请求交错产生两个默认记录。
///
/// ```ignore
/// let _guard = state.user_locks.acquire(&user.id).await;
/// // 锁持有期间，该用户的其他写请求排队等待
/// repo.set_default(&user.id, &address_id).await?;
/// ```
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    /// 创建空的锁管理器
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// 获取指定用户的写锁
    ///
    /// 返回的 guard 被 drop 时自动释放。
    /// 锁按需创建，首次访问的用户从无竞争状态开始。
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_serializes() {
        let locks = UserLocks::new();

        let guard = locks.acquire("user:alice").await;

        // Second acquire on the same user must wait for the first guard
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire("user:alice"));
        assert!(blocked.await.is_err());

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire("user:alice"));
        assert!(reacquired.await.is_ok());
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = UserLocks::new();

        let _alice = locks.acquire("user:alice").await;
        let bob = tokio::time::timeout(Duration::from_millis(50), locks.acquire("user:bob"));
        assert!(bob.await.is_ok());
    }
}
