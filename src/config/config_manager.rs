// ==========================================
// 履约有效率系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::{ChunkPolicy, StatusLabels};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

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
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置；格式错误或为 0 时回退默认值
    fn get_positive_usize(&self, key: &str, default: usize) -> ConfigResult<usize> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置值非法，使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入配置（UPSERT，scope_id='global'）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value = %value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置（键有序）
    pub fn list_config_values(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let config_map = self.list_config_values()?;
        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_chunk_policy(&self) -> ConfigResult<ChunkPolicy> {
        let defaults = ChunkPolicy::default();
        Ok(ChunkPolicy {
            chunk_size: self.get_positive_usize(config_keys::CHUNK_SIZE, defaults.chunk_size)?,
            large_chunk_size: self
                .get_positive_usize(config_keys::LARGE_CHUNK_SIZE, defaults.large_chunk_size)?,
            large_batch_threshold: self.get_positive_usize(
                config_keys::LARGE_BATCH_THRESHOLD,
                defaults.large_batch_threshold,
            )?,
        })
    }

    async fn get_status_labels(&self) -> ConfigResult<StatusLabels> {
        let defaults = StatusLabels::default();

        let delivered = self
            .get_config_value(config_keys::DELIVERED_STATUS)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.delivered);

        let returned: Vec<String> = self
            .get_config_value(config_keys::RETURN_STATUSES)?
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(StatusLabels {
            delivered,
            returned: if returned.is_empty() {
                defaults.returned
            } else {
                returned
            },
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分块写入
    pub const CHUNK_SIZE: &str = "ingest.chunk_size";
    pub const LARGE_CHUNK_SIZE: &str = "ingest.large_chunk_size";
    pub const LARGE_BATCH_THRESHOLD: &str = "ingest.large_batch_threshold";

    // 指标口径
    pub const DELIVERED_STATUS: &str = "metrics.delivered_status";
    pub const RETURN_STATUSES: &str = "metrics.return_statuses"; // 逗号分隔

    /// 全部已知配置键
    pub const ALL: &[&str] = &[
        CHUNK_SIZE,
        LARGE_CHUNK_SIZE,
        LARGE_BATCH_THRESHOLD,
        DELIVERED_STATUS,
        RETURN_STATUSES,
    ];
}
