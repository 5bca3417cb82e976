/// 跨帧结果过滤器 - 去重与交叉验证
/// Multi-frame result cross filter: deduplication + cross verification
use super::settings::EngineSettings;
use super::types::BarcodeItem;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 单个条码条目的观测记录
struct SeenRecord {
    /// 最近一次观测到的时刻
    last_seen: Instant,
    /// 窗口内的观测次数 (交叉验证用)
    sightings: u32,
    /// 最近一次上报的时刻 (去重用)
    last_reported: Option<Instant>,
}

/// 跨帧交叉过滤器
///
/// - 交叉验证: 同一条码至少在窗口内出现2帧才允许上报, 过滤单帧误读;
/// - 去重: 遗忘窗口内已上报过的条码不再重复上报。
pub struct MultiFrameCrossFilter {
    enable_deduplication: bool,
    enable_cross_verification: bool,
    forget_time: Duration,
    seen: HashMap<BarcodeItem, SeenRecord>,
}

impl MultiFrameCrossFilter {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            enable_deduplication: settings.enable_deduplication,
            enable_cross_verification: settings.enable_cross_verification,
            forget_time: Duration::from_millis(settings.duplicate_forget_time_ms),
            seen: HashMap::new(),
        }
    }

    /// 过滤一帧的解码条目, 返回允许上报的子集
    pub fn admit(&mut self, items: Vec<BarcodeItem>) -> Vec<BarcodeItem> {
        self.admit_at(items, Instant::now())
    }

    /// 注入时钟的实现, 便于确定性测试
    fn admit_at(&mut self, items: Vec<BarcodeItem>, now: Instant) -> Vec<BarcodeItem> {
        self.prune(now);

        let mut admitted = Vec::new();
        for item in items {
            let record = self.seen.entry(item.clone()).or_insert(SeenRecord {
                last_seen: now,
                sightings: 0,
                last_reported: None,
            });
            record.last_seen = now;
            record.sightings += 1;

            if self.enable_cross_verification && record.sightings < 2 {
                continue;
            }
            if self.enable_deduplication {
                if let Some(reported) = record.last_reported {
                    if now.duration_since(reported) < self.forget_time {
                        continue;
                    }
                }
            }

            record.last_reported = Some(now);
            admitted.push(item);
        }
        admitted
    }

    /// 清理遗忘窗口外的过期记录
    fn prune(&mut self, now: Instant) {
        let forget = self.forget_time;
        self.seen
            .retain(|_, rec| now.duration_since(rec.last_seen) < forget);
    }

    /// 当前跟踪的条目数
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}
