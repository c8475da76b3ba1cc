// ==========================================
// 物流管理系统 - 导入事件（缓存失效 + 用户通知）
// ==========================================
// 职责: 定义导入完成后对外通知的 trait，实现依赖倒置
// 说明: 导入层只依赖 trait，宿主应用实现具体适配器
// ==========================================

use crate::domain::{ImportKind, Owner};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

// ==========================================
// 查询缓存键
// ==========================================

/// 揽收/派送报表维度（聚合揽收数据的看板）
pub const COLLECTION_REPORT_DIMENSIONS: [&str; 3] = ["status-chart", "metrics", "donut-chart"];

/// 被缓存的查询键：名称 + 账户 + 可选报表维度
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    pub name: String,
    pub owner_id: String,
    pub dimension: Option<String>,
}

impl QueryKey {
    pub fn new(name: &str, owner: &Owner) -> Self {
        Self {
            name: name.to_string(),
            owner_id: owner.user_id.clone(),
            dimension: None,
        }
    }

    pub fn with_dimension(name: &str, owner: &Owner, dimension: &str) -> Self {
        Self {
            dimension: Some(dimension.to_string()),
            ..Self::new(name, owner)
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dimension {
            Some(dimension) => write!(f, "{}/{}/{}", self.name, self.owner_id, dimension),
            None => write!(f, "{}/{}", self.name, self.owner_id),
        }
    }
}

/// 写入某种类后需要失效的全部查询键
///
/// - 揽收/派送: collections、items 及各报表维度
/// - 技术员/主管: 各自列表 + profiles 汇总
pub fn invalidation_keys(kind: ImportKind, owner: &Owner) -> Vec<QueryKey> {
    match kind {
        ImportKind::Collections => {
            let mut keys = vec![
                QueryKey::new("collections", owner),
                QueryKey::new("items", owner),
            ];
            keys.extend(
                COLLECTION_REPORT_DIMENSIONS
                    .iter()
                    .map(|d| QueryKey::with_dimension("collections", owner, d)),
            );
            keys
        }
        ImportKind::Products => vec![QueryKey::new("products", owner)],
        ImportKind::Clients => vec![QueryKey::new("clients", owner)],
        ImportKind::Technicians | ImportKind::Supervisors => vec![
            QueryKey::new(kind.as_str(), owner),
            QueryKey::new("profiles", owner),
        ],
    }
}

// ==========================================
// 缓存失效 Trait
// ==========================================

pub trait CacheInvalidator: Send + Sync {
    /// 失效一组查询键
    fn invalidate(&self, keys: &[QueryKey]) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作失效器
///
/// 用于没有查询缓存的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpInvalidator;

impl CacheInvalidator for NoOpInvalidator {
    fn invalidate(&self, keys: &[QueryKey]) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(keys = keys.len(), "NoOpInvalidator: 跳过缓存失效");
        Ok(())
    }
}

/// 记录收到的查询键（供宿主轮询或测试断言）
#[derive(Debug, Default)]
pub struct RecordingInvalidator {
    keys: Mutex<Vec<QueryKey>>,
}

impl RecordingInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.keys
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// 取出并清空已记录的键
    pub fn take(&self) -> Vec<QueryKey> {
        match self.keys.lock() {
            Ok(mut keys) => std::mem::take(&mut *keys),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl CacheInvalidator for RecordingInvalidator {
    fn invalidate(&self, keys: &[QueryKey]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut recorded = self.keys.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        recorded.extend_from_slice(keys);
        Ok(())
    }
}

// ==========================================
// 用户通知
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// 导入通知接收者（宿主 UI 实现：提示条、关闭对话框）
pub trait ImportNotifier: Send + Sync {
    fn notify(&self, notification: Notification);

    /// 导入完成（对应"关闭对话框"）
    fn on_import_completed(&self, kind: ImportKind, count: usize);
}

/// 将通知写入日志
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl ImportNotifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!(message = %notification.message, "导入通知"),
            NotificationLevel::Warning => tracing::warn!(message = %notification.message, "导入通知"),
            NotificationLevel::Error => tracing::error!(message = %notification.message, "导入通知"),
        }
    }

    fn on_import_completed(&self, kind: ImportKind, count: usize) {
        tracing::info!(kind = %kind, count, "导入完成");
    }
}

/// 默认通知组合：日志通知 + 空操作失效器
pub fn default_collaborators() -> (Arc<dyn ImportNotifier>, Arc<dyn CacheInvalidator>) {
    (Arc::new(LogNotifier), Arc::new(NoOpInvalidator))
}
