// ==========================================
// PLC 硬件配置系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{IoApi, ProvisioningApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{IoRepositories, ProvisioningOrchestrator};
use crate::repository::{ActionLogRepository, ModuleTypeRepository, RepositoryError, RepositoryResult};

/// 应用状态
///
/// 所有仓储共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 节点配置API
    pub provisioning_api: Arc<ProvisioningApi>,

    /// I/O 人工分配API
    pub io_api: Arc<IoApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 模块目录仓储（目录维护）
    pub module_type_repo: Arc<ModuleTypeRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化 schema（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("无法打开数据库: {}", e))
        })?;
        Self::from_connection(db_path, conn)
    }

    /// 基于已打开的连接创建（测试可传入内存库）
    pub fn from_connection(db_path: String, conn: Connection) -> RepositoryResult<Self> {
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let module_type_repo = Arc::new(ModuleTypeRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let seeded = module_type_repo.seed_default_catalog()?;
        if seeded > 0 {
            tracing::info!(seeded, "已写入标准模块目录");
        }

        let orchestrator = Arc::new(ProvisioningOrchestrator::new(
            IoRepositories::sqlite(conn),
            config_manager.clone(),
        ));

        let provisioning_api = Arc::new(ProvisioningApi::new(
            orchestrator.clone(),
            action_log_repo.clone(),
        ));
        let io_api = Arc::new(IoApi::new(orchestrator, action_log_repo.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            provisioning_api,
            io_api,
            config_manager,
            module_type_repo,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PLC_IO_PROVISION_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PLC_IO_PROVISION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./plc_io_provision.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("plc-io-provision");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("plc_io_provision.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_connection_seeds_catalog_once() {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::from_connection(":memory:".to_string(), conn).unwrap();
        assert_eq!(state.module_type_repo.list_all().unwrap().len(), 8);
        assert_eq!(state.module_type_repo.seed_default_catalog().unwrap(), 0);
    }

    #[test]
    fn test_default_db_path_from_env() {
        std::env::set_var("PLC_IO_PROVISION_DB_PATH", "/tmp/custom.db");
        assert_eq!(get_default_db_path(), "/tmp/custom.db");
        std::env::remove_var("PLC_IO_PROVISION_DB_PATH");
    }
}
