/// 引擎预设模板与参数
/// Preset templates and tunable settings for the capture engine
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 预设模板 (启动捕获时按名字选择一套参数)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresetTemplate {
    /// 标准条码读取
    ReadBarcodes,
}

impl PresetTemplate {
    pub fn name(&self) -> &str {
        match self {
            PresetTemplate::ReadBarcodes => "read-barcodes",
        }
    }
}

/// 输入队列溢出保护模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferOverflowProtection {
    /// 阻塞等待队列腾出空间
    Block,
    /// 丢弃新帧, 保留旧帧
    DropNew,
    /// 丢弃最旧的帧, 保留新帧 (默认)
    Update,
}

/// 引擎参数 (可从JSON模板加载)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// 输入队列最大帧数
    pub max_image_count: usize,
    /// 溢出保护模式
    pub overflow_protection: BufferOverflowProtection,
    /// 是否启用跨帧去重
    pub enable_deduplication: bool,
    /// 是否启用跨帧交叉验证
    pub enable_cross_verification: bool,
    /// 去重遗忘窗口 (毫秒)
    pub duplicate_forget_time_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_image_count: 100,
            overflow_protection: BufferOverflowProtection::Update,
            enable_deduplication: true,
            enable_cross_verification: true,
            duplicate_forget_time_ms: 5000,
        }
    }
}

impl EngineSettings {
    /// 按预设模板生成参数
    pub fn preset(template: PresetTemplate) -> Self {
        match template {
            PresetTemplate::ReadBarcodes => Self::default(),
        }
    }

    /// 从JSON模板字符串加载参数
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("引擎模板JSON解析失败")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_read_barcodes_preset() {
        let preset = EngineSettings::preset(PresetTemplate::ReadBarcodes);
        assert_eq!(preset.max_image_count, 100);
        assert_eq!(preset.overflow_protection, BufferOverflowProtection::Update);
        assert!(preset.enable_deduplication);
        assert!(preset.enable_cross_verification);
        assert_eq!(preset.duplicate_forget_time_ms, 5000);
    }

    #[test]
    fn test_from_json_partial_override() {
        let settings =
            EngineSettings::from_json(r#"{"max_image_count": 10, "overflow_protection": "block"}"#)
                .unwrap();
        assert_eq!(settings.max_image_count, 10);
        assert_eq!(settings.overflow_protection, BufferOverflowProtection::Block);
        // 未覆盖的字段保持默认
        assert_eq!(settings.duplicate_forget_time_ms, 5000);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(EngineSettings::from_json("not json").is_err());
    }
}
