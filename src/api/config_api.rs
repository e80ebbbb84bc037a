// ==========================================
// 履约有效率系统 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新、快照
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, ConfigManager};
use crate::config::ImportConfigReader;
use crate::domain::{ChunkPolicy, StatusLabels, MAX_CHUNK_SIZE};

/// 配置项（生效值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: String,
    /// 是否为未写入 config_kv 的默认值
    pub is_default: bool,
}

fn default_value(key: &str) -> Option<String> {
    let policy = ChunkPolicy::default();
    let labels = StatusLabels::default();
    let value = match key {
        config_keys::CHUNK_SIZE => policy.chunk_size.to_string(),
        config_keys::LARGE_CHUNK_SIZE => policy.large_chunk_size.to_string(),
        config_keys::LARGE_BATCH_THRESHOLD => policy.large_batch_threshold.to_string(),
        config_keys::DELIVERED_STATUS => labels.delivered,
        config_keys::RETURN_STATUSES => labels.returned.join(","),
        _ => return None,
    };
    Some(value)
}

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询全部已知配置的生效值
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        config_keys::ALL
            .iter()
            .map(|key| self.get_config(key))
            .filter_map(|item| item.transpose())
            .collect()
    }

    /// 查询单个配置的生效值
    ///
    /// # 返回
    /// - Ok(None): 未知键且未写入
    pub fn get_config(&self, key: &str) -> ApiResult<Option<ConfigItem>> {
        let stored = self
            .config_manager
            .get_global_config_value(key)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;

        Ok(match (stored, default_value(key)) {
            (Some(value), _) => Some(ConfigItem {
                key: key.to_string(),
                value,
                is_default: false,
            }),
            (None, Some(value)) => Some(ConfigItem {
                key: key.to_string(),
                value,
                is_default: true,
            }),
            (None, None) => None,
        })
    }

    /// 更新配置
    ///
    /// 仅接受已知键；分块相关键必须为正整数，分块大小不超过 MAX_CHUNK_SIZE；
    /// 妥投标签与退货标签不得重叠
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let key = key.trim();
        let value = value.trim();

        if !config_keys::ALL.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知配置键: {}", key)));
        }
        if value.is_empty() {
            return Err(ApiError::InvalidInput(format!("配置值不能为空: {}", key)));
        }

        let numeric = [
            config_keys::CHUNK_SIZE,
            config_keys::LARGE_CHUNK_SIZE,
            config_keys::LARGE_BATCH_THRESHOLD,
        ];
        if numeric.contains(&key) && !matches!(value.parse::<usize>(), Ok(v) if v > 0) {
            return Err(ApiError::InvalidInput(format!(
                "{} 必须为正整数，实际为 {}",
                key, value
            )));
        }

        let chunk_keys = [config_keys::CHUNK_SIZE, config_keys::LARGE_CHUNK_SIZE];
        let oversized = matches!(value.parse::<usize>(), Ok(v) if v > MAX_CHUNK_SIZE);
        if chunk_keys.contains(&key) && oversized {
            return Err(ApiError::InvalidInput(format!(
                "{} 不能超过 {}，实际为 {}",
                key, MAX_CHUNK_SIZE, value
            )));
        }

        self.check_status_overlap(key, value)?;

        self.config_manager
            .set_config_value(key, value)
            .map_err(|e| ApiError::Persistence(e.to_string()))
    }

    /// 同一状态不能既算妥投又算退货
    fn check_status_overlap(&self, key: &str, value: &str) -> ApiResult<()> {
        let (delivered, returned) = match key {
            config_keys::DELIVERED_STATUS => {
                (value.to_string(), self.effective_value(config_keys::RETURN_STATUSES)?)
            }
            config_keys::RETURN_STATUSES => {
                (self.effective_value(config_keys::DELIVERED_STATUS)?, value.to_string())
            }
            _ => return Ok(()),
        };

        if returned.split(',').map(str::trim).any(|label| label == delivered) {
            return Err(ApiError::InvalidInput(format!(
                "状态 {} 不能同时作为妥投与退货标签",
                delivered
            )));
        }
        Ok(())
    }

    fn effective_value(&self, key: &str) -> ApiResult<String> {
        Ok(self
            .get_config(key)?
            .map(|item| item.value.trim().to_string())
            .unwrap_or_default())
    }

    /// 当前生效的分块策略
    pub async fn chunk_policy(&self) -> ApiResult<ChunkPolicy> {
        self.config_manager
            .get_chunk_policy()
            .await
            .map_err(|e| ApiError::Persistence(e.to_string()))
    }

    /// 配置快照（JSON）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::Persistence(e.to_string()))
    }
}
