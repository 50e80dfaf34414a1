// ==========================================
// PLC 硬件配置系统 - 按项目互斥锁
// ==========================================
// 同一项目的配置 / 分配 / 人工调整串行执行，不同项目互不阻塞
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

/// 键守卫: 释放时解锁，无人等待的键从表中移除
#[derive(Debug)]
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.prune(self.key);
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取某个键的互斥守卫（释放守卫即解锁）
    pub async fn acquire(&self, key: i64) -> KeyGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots
                .entry(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        KeyGuard {
            locks: self,
            key,
            guard: Some(slot.lock_owned().await),
        }
    }

    // 表内引用为唯一持有者时移除（克隆与检查都在表锁内进行）
    fn prune(&self, key: i64) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if slots.get(&key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(&key);
        }
    }

    /// 当前持有或等待中的键数量
    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
