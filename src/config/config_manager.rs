// ==========================================
// PLC 硬件配置系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::provisioning_config::{ProvisioningConfig, ProvisioningConfigReader};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 从 config_kv 表读取配置值，带默认值（空白值视为未配置）
    fn get_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取自动配置参数（缺失项取默认值）
    pub fn provisioning_config(&self) -> RepositoryResult<ProvisioningConfig> {
        let mut cfg = ProvisioningConfig::default();

        cfg.node_template.name =
            self.get_or_default(config_keys::NODE_NAME, &cfg.node_template.name)?;
        cfg.node_template.node_type =
            self.get_or_default(config_keys::NODE_TYPE, &cfg.node_template.node_type)?;
        if let Some(desc) = self.get_global_value(config_keys::NODE_DESCRIPTION)? {
            cfg.node_template.description = Some(desc);
        }

        for (signal_type, module_name) in cfg.default_modules.iter_mut() {
            let key = config_keys::default_module(*signal_type);
            *module_name = self.get_or_default(&key, module_name)?;
        }

        cfg.address.cpu = self.get_or_default(config_keys::CPU_LABEL, &cfg.address.cpu)?;
        cfg.address.rack = self.get_or_default(config_keys::RACK_LABEL, &cfg.address.rack)?;

        Ok(cfg)
    }
}

// ==========================================
// ProvisioningConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ProvisioningConfigReader for ConfigManager {
    async fn get_provisioning_config(&self) -> RepositoryResult<ProvisioningConfig> {
        self.provisioning_config()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::SignalType;

    // 自动创建节点
    pub const NODE_NAME: &str = "provisioning/node_name";
    pub const NODE_TYPE: &str = "provisioning/node_type";
    pub const NODE_DESCRIPTION: &str = "provisioning/node_description";

    // 默认模块型号前缀（后接信号类型代码）
    pub const DEFAULT_MODULE_PREFIX: &str = "provisioning/default_module/";

    // 批量分配地址
    pub const CPU_LABEL: &str = "allocation/cpu_label";
    pub const RACK_LABEL: &str = "allocation/rack_label";

    /// 某信号类型的默认模块配置键
    pub fn default_module(signal_type: SignalType) -> String {
        format!("{}{}", DEFAULT_MODULE_PREFIX, signal_type.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SignalType;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_table_empty() {
        let manager = setup();
        let cfg = manager.provisioning_config().unwrap();
        assert_eq!(cfg, ProvisioningConfig::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let manager = setup();
        manager.set_global_value(config_keys::NODE_NAME, "CPU02").unwrap();
        manager
            .set_global_value(&config_keys::default_module(SignalType::DigitalInput), "DI32")
            .unwrap();
        manager.set_global_value(config_keys::RACK_LABEL, "1").unwrap();
        // 空白值视为未配置
        manager.set_global_value(config_keys::CPU_LABEL, "  ").unwrap();

        let cfg = manager.provisioning_config().unwrap();
        assert_eq!(cfg.node_template.name, "CPU02");
        assert_eq!(cfg.default_modules[&SignalType::DigitalInput], "DI32");
        assert_eq!(cfg.default_modules[&SignalType::DigitalOutput], "DO16");
        assert_eq!(cfg.address.rack, "1");
        assert_eq!(cfg.address.cpu, "CPU1");
    }

    #[test]
    fn test_set_global_value_upserts() {
        let manager = setup();
        manager.set_global_value(config_keys::NODE_TYPE, "PLC").unwrap();
        manager.set_global_value(config_keys::NODE_TYPE, "ET200").unwrap();
        assert_eq!(
            manager.get_global_value(config_keys::NODE_TYPE).unwrap(),
            Some("ET200".to_string())
        );
    }
}
