// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use plc_io_provision::config::{ConfigManager, ProvisioningConfig};
use plc_io_provision::db::{init_schema, open_sqlite_connection};
use plc_io_provision::domain::hardware::{ChannelCapacity, ModuleInstance};
use plc_io_provision::domain::signal::{IoSignal, NewIoSignal};
use plc_io_provision::domain::types::SignalType;
use plc_io_provision::engine::{IoRepositories, ProvisioningOrchestrator};
use plc_io_provision::repository::{
    ActionLogRepository, IoAddress, ModuleInstanceRepository, ModuleTypeRepository,
    NewModuleType, NodeRepository, RepositoryError, RepositoryResult, SignalRepository,
    SignalStore,
};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 测试环境（所有仓储共享同一连接）
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub signal_repo: Arc<SignalRepository>,
    pub module_type_repo: Arc<ModuleTypeRepository>,
    pub module_repo: Arc<ModuleInstanceRepository>,
    pub node_repo: Arc<NodeRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
    pub config_manager: Arc<ConfigManager>,
}

impl TestEnv {
    /// 仓储集合（全部为 rusqlite 实现）
    pub fn repos(&self) -> IoRepositories {
        IoRepositories::sqlite(self.conn.clone())
    }

    /// 信号仓储替换为故障注入替身，其余为 rusqlite 实现
    pub fn repos_failing(&self, fail: FailPoint) -> IoRepositories {
        let sqlite = self.repos();
        IoRepositories::new(
            Arc::new(FailingSignalStore::new(self.conn.clone(), fail)),
            sqlite.catalog,
            sqlite.modules,
            sqlite.nodes,
        )
    }

    /// 以 config_kv 为配置源的编排器
    pub fn orchestrator(&self) -> ProvisioningOrchestrator<ConfigManager> {
        ProvisioningOrchestrator::new(self.repos(), self.config_manager.clone())
    }

    /// 以固定配置为配置源的编排器
    pub fn orchestrator_with(
        &self,
        config: ProvisioningConfig,
    ) -> ProvisioningOrchestrator<ProvisioningConfig> {
        ProvisioningOrchestrator::new(self.repos(), Arc::new(config))
    }
}

// ==========================================
// 故障注入替身: 指定槽位的模块读写失败
// ==========================================

/// 失败注入点
#[derive(Debug, Clone, Copy)]
pub enum FailPoint {
    /// 写入该槽位模块时失败
    AssignOnSlot(i32),
    /// 统计该槽位模块已分配数时失败
    CountOnSlot(i32),
}

pub struct FailingSignalStore {
    inner: SignalRepository,
    modules: ModuleInstanceRepository,
    fail: FailPoint,
}

impl FailingSignalStore {
    pub fn new(conn: Arc<Mutex<Connection>>, fail: FailPoint) -> Self {
        Self {
            inner: SignalRepository::new(conn.clone()),
            modules: ModuleInstanceRepository::new(conn),
            fail,
        }
    }

    fn slot_of(&self, module_id: i64) -> RepositoryResult<Option<i32>> {
        Ok(self.modules.find_by_id(module_id)?.map(|m| m.slot))
    }
}

#[async_trait]
impl SignalStore for FailingSignalStore {
    async fn find_signal(&self, signal_id: i64) -> RepositoryResult<Option<IoSignal>> {
        self.inner.find_signal(signal_id).await
    }

    async fn count_by_project_and_type(
        &self,
        project_id: i64,
        signal_type: SignalType,
    ) -> RepositoryResult<usize> {
        self.inner.count_by_project_and_type(project_id, signal_type).await
    }

    async fn list_unassigned(
        &self,
        project_id: i64,
        signal_type: Option<SignalType>,
    ) -> RepositoryResult<Vec<IoSignal>> {
        self.inner.list_unassigned(project_id, signal_type).await
    }

    async fn count_on_module(
        &self,
        module_id: i64,
        signal_type: SignalType,
    ) -> RepositoryResult<usize> {
        if let FailPoint::CountOnSlot(slot) = self.fail {
            if self.slot_of(module_id)? == Some(slot) {
                return Err(RepositoryError::DatabaseQueryError(
                    "模拟读取失败".to_string(),
                ));
            }
        }
        self.inner.count_on_module(module_id, signal_type).await
    }

    async fn list_by_module(&self, module_id: i64) -> RepositoryResult<Vec<IoSignal>> {
        self.inner.list_by_module(module_id).await
    }

    async fn assign_to_module(
        &self,
        module: &ModuleInstance,
        signal_ids: &[i64],
        address: Option<&IoAddress>,
    ) -> RepositoryResult<usize> {
        if let FailPoint::AssignOnSlot(slot) = self.fail {
            if module.slot == slot {
                return Err(RepositoryError::DatabaseTransactionError(
                    "模拟磁盘写入失败".to_string(),
                ));
            }
        }
        self.inner.assign_to_module(module, signal_ids, address).await
    }

    async fn clear_assignment(&self, signal_id: i64) -> RepositoryResult<bool> {
        self.inner.clear_assignment(signal_id).await
    }
}

/// 创建测试环境并写入标准模块目录
pub fn setup_env() -> TestEnv {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));

    let module_type_repo = Arc::new(ModuleTypeRepository::new(conn.clone()));
    module_type_repo.seed_default_catalog().unwrap();

    TestEnv {
        _temp_file: temp_file,
        db_path,
        signal_repo: Arc::new(SignalRepository::new(conn.clone())),
        module_type_repo,
        module_repo: Arc::new(ModuleInstanceRepository::new(conn.clone())),
        node_repo: Arc::new(NodeRepository::new(conn.clone())),
        action_log_repo: Arc::new(ActionLogRepository::new(conn.clone())),
        config_manager: Arc::new(ConfigManager::from_connection(conn.clone()).unwrap()),
        conn,
    }
}

/// 批量写入同类型信号
///
/// # 参数
/// - positions: 每个信号的位置标签（None = 未设置）
pub fn insert_signals(
    env: &TestEnv,
    project_id: i64,
    signal_type: SignalType,
    positions: &[Option<&str>],
) -> Vec<i64> {
    let signals: Vec<NewIoSignal> = positions
        .iter()
        .enumerate()
        .map(|(i, pos)| {
            NewIoSignal::new(
                project_id,
                &format!("{}-{}", signal_type.code(), i + 1),
                signal_type,
                *pos,
            )
        })
        .collect();
    env.signal_repo.batch_insert(&signals).unwrap()
}

/// 写入 n 个未设置位置的同类型信号
pub fn insert_n_signals(env: &TestEnv, project_id: i64, signal_type: SignalType, n: usize) -> Vec<i64> {
    insert_signals(env, project_id, signal_type, &vec![None; n])
}

/// 写入自定义模块型号
pub fn insert_module_type(
    env: &TestEnv,
    name: &str,
    kind: SignalType,
    capacity: ChannelCapacity,
) -> i64 {
    env.module_type_repo
        .insert(&NewModuleType::new(name, kind, capacity))
        .unwrap()
}

/// 节点模块槽位（升序）
pub fn node_slots(env: &TestEnv, node_id: i64) -> Vec<i32> {
    env.module_repo
        .find_by_node(node_id)
        .unwrap()
        .iter()
        .map(|m| m.slot)
        .collect()
}

/// 节点模块型号名称（按槽位升序）
pub fn node_module_names(env: &TestEnv, node_id: i64) -> Vec<String> {
    let conn = env.conn.lock().unwrap();
    let mut stmt = conn
        .prepare(
            r#"
            SELECT t.name FROM module_instance m
            JOIN module_type t ON t.module_type_id = m.module_type_id
            WHERE m.node_id = ?1
            ORDER BY m.slot
            "#,
        )
        .unwrap();
    stmt.query_map(params![node_id], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

/// 统计项目已分配信号数
pub fn count_assigned(env: &TestEnv, project_id: i64) -> usize {
    let conn = env.conn.lock().unwrap();
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM io_signal WHERE project_id = ?1 AND module_id IS NOT NULL",
            params![project_id],
            |row| row.get(0),
        )
        .unwrap();
    n as usize
}

/// 校验容量不变式: 任一模块上承载类型的信号数不超过容量
pub fn assert_capacity_invariant(env: &TestEnv, node_id: i64) {
    for module in env.module_repo.find_by_node(node_id).unwrap() {
        let module_type = env
            .module_type_repo
            .find_by_id(module.module_type_id)
            .unwrap()
            .unwrap();
        let Some(governing) = module_type.governing_type else {
            continue;
        };
        let capacity = module_type
            .capacity
            .get(plc_io_provision::engine::capacity_field(governing));
        let on_module = env
            .signal_repo
            .count_by_module_and_type(module.module_id, governing)
            .unwrap();
        assert!(
            on_module <= capacity as usize,
            "模块 {} 超出容量: {} > {}",
            module.module_id,
            on_module,
            capacity
        );
    }
}
