// ==========================================
// PLC 硬件配置系统 - 模块目录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 目录对引擎只读；写入接口仅供目录维护与测试数据准备
// ==========================================

use crate::domain::hardware::{ChannelCapacity, ModuleType};
use crate::domain::types::SignalType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::traits::ModuleCatalog;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const MODULE_TYPE_COLUMNS: &str =
    "module_type_id, name, description, kind, cap_di, cap_do, cap_ai, cap_ao, cap_fdi, cap_fdo";

fn map_module_type_row(row: &Row) -> rusqlite::Result<ModuleType> {
    let kind_tag: String = row.get(3)?;
    Ok(ModuleType {
        module_type_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        governing_type: SignalType::from_tag(&kind_tag),
        kind_tag,
        capacity: ChannelCapacity {
            di: row.get(4)?,
            dout: row.get(5)?,
            ai: row.get(6)?,
            ao: row.get(7)?,
            f_di: row.get(8)?,
            f_do: row.get(9)?,
        },
    })
}

// ==========================================
// NewModuleType - 目录条目写入载体
// ==========================================
#[derive(Debug, Clone)]
pub struct NewModuleType {
    pub name: String,
    pub description: Option<String>,
    pub kind_tag: String,
    pub capacity: ChannelCapacity,
}

impl NewModuleType {
    /// 以标准信号类型创建单一用途模块
    pub fn new(name: &str, kind: SignalType, capacity: ChannelCapacity) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            kind_tag: kind.code().to_string(),
            capacity,
        }
    }
}

/// 标准模块目录（八种默认模块）
pub fn default_catalog() -> Vec<NewModuleType> {
    let cap = ChannelCapacity::default;
    vec![
        NewModuleType::new("FDI16", SignalType::DigitalInputFailSafe, ChannelCapacity { f_di: 16, ..cap() }),
        NewModuleType::new("FDO16", SignalType::DigitalOutputFailSafe, ChannelCapacity { f_do: 16, ..cap() }),
        NewModuleType::new("DI16", SignalType::DigitalInput, ChannelCapacity { di: 16, ..cap() }),
        NewModuleType::new("DO16", SignalType::DigitalOutput, ChannelCapacity { dout: 16, ..cap() }),
        NewModuleType::new("AI4 (4-20mA)", SignalType::AnalogInputCurrent, ChannelCapacity { ai: 4, ..cap() }),
        NewModuleType::new("AI4 (0-10V)", SignalType::AnalogInputVoltage, ChannelCapacity { ai: 4, ..cap() }),
        NewModuleType::new("AO4 (4-20mA)", SignalType::AnalogOutputCurrent, ChannelCapacity { ao: 4, ..cap() }),
        NewModuleType::new("AO4 (0-10V)", SignalType::AnalogOutputVoltage, ChannelCapacity { ao: 4, ..cap() }),
    ]
}

// ==========================================
// ModuleTypeRepository - 模块目录仓储
// ==========================================
pub struct ModuleTypeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ModuleTypeRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入目录条目
    pub fn insert(&self, module_type: &NewModuleType) -> RepositoryResult<i64> {
        if module_type.name.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "name".to_string(),
                message: "模块型号不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        let cap = &module_type.capacity;
        conn.execute(
            r#"
            INSERT INTO module_type (
                name, description, kind, cap_di, cap_do, cap_ai, cap_ao, cap_fdi, cap_fdo
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                module_type.name,
                module_type.description,
                module_type.kind_tag,
                cap.di,
                cap.dout,
                cap.ai,
                cap.ao,
                cap.f_di,
                cap.f_do,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 写入标准目录（已存在同名条目则跳过）
    ///
    /// # 返回
    /// 新写入的条目数
    pub fn seed_default_catalog(&self) -> RepositoryResult<usize> {
        let mut inserted = 0;
        for entry in default_catalog() {
            if self.find_by_name(&entry.name)?.is_none() {
                self.insert(&entry)?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// 按型号名称查询（同名取最小ID）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<ModuleType>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM module_type WHERE name = ?1 ORDER BY module_type_id LIMIT 1",
            MODULE_TYPE_COLUMNS
        );
        let found = conn
            .query_row(&sql, params![name], map_module_type_row)
            .optional()?;
        Ok(found)
    }

    /// 按ID查询
    pub fn find_by_id(&self, module_type_id: i64) -> RepositoryResult<Option<ModuleType>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM module_type WHERE module_type_id = ?1",
            MODULE_TYPE_COLUMNS
        );
        let found = conn
            .query_row(&sql, params![module_type_id], map_module_type_row)
            .optional()?;
        Ok(found)
    }

    /// 查询全部目录条目
    pub fn list_all(&self) -> RepositoryResult<Vec<ModuleType>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM module_type ORDER BY module_type_id",
            MODULE_TYPE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let types = stmt
            .query_map([], map_module_type_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(types)
    }
}

// ==========================================
// ModuleCatalog trait 实现
// ==========================================
#[async_trait]
impl ModuleCatalog for ModuleTypeRepository {
    async fn find_type_by_name(&self, name: &str) -> RepositoryResult<Option<ModuleType>> {
        self.find_by_name(name)
    }

    async fn find_type(&self, module_type_id: i64) -> RepositoryResult<Option<ModuleType>> {
        self.find_by_id(module_type_id)
    }
}
