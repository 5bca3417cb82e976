/// 捕获会话 - 引擎的路由与生命周期管理
/// Capture session: owns the worker thread between start and stop
use super::decoder;
use super::filter::MultiFrameCrossFilter;
use super::settings::{EngineSettings, PresetTemplate};
use super::types::{CapturedResultReceiver, DecodedBarcodesResult, ResultStatus, VideoFrame};
use super::VideoFrameSource;
use anyhow::{bail, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// 捕获会话
///
/// 配置 (输入源/过滤器/接收器) 必须在 start_capturing 之前完成,
/// 会话运行期间的配置调用直接报错, 不会被静默吞掉。
pub struct CaptureSession {
    input: Option<Receiver<VideoFrame>>,
    filter: Option<MultiFrameCrossFilter>,
    receivers: Vec<Box<dyn CapturedResultReceiver>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            input: None,
            filter: None,
            receivers: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.worker.is_some() {
            bail!("会话运行中, 不允许修改配置");
        }
        Ok(())
    }

    /// 设置输入源 (持有其消费端)
    pub fn set_input(&mut self, source: &VideoFrameSource) -> Result<()> {
        self.ensure_stopped()?;
        self.input = Some(source.receiver());
        Ok(())
    }

    /// 挂载跨帧结果过滤器
    pub fn add_result_filter(&mut self, filter: MultiFrameCrossFilter) -> Result<()> {
        self.ensure_stopped()?;
        self.filter = Some(filter);
        Ok(())
    }

    /// 注册结果接收器
    pub fn add_result_receiver(&mut self, receiver: Box<dyn CapturedResultReceiver>) -> Result<()> {
        self.ensure_stopped()?;
        self.receivers.push(receiver);
        Ok(())
    }

    /// 启动异步捕获, 按预设模板运行
    pub fn start_capturing(&mut self, template: PresetTemplate) -> Result<()> {
        if self.worker.is_some() {
            bail!("会话已在运行");
        }
        let Some(rx) = self.input.take() else {
            bail!("未设置输入源");
        };

        let mut filter = self.filter.take();
        let receivers = std::mem::take(&mut self.receivers);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Relaxed);

        println!("🚀 引擎启动 | 模板: {}", template.name());

        let handle = std::thread::spawn(move || {
            println!("✅ 引擎工作线程启动");
            let mut processed: u64 = 0;

            while running.load(Ordering::Relaxed) {
                let frame = match rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(f) => f,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                processed += 1;
                if let Some(result) = process_frame(&frame, &mut filter) {
                    for receiver in &receivers {
                        receiver.on_decoded_barcodes(&result);
                    }
                }
            }

            println!("✅ 引擎工作线程退出 | 共处理 {} 帧", processed);
        });

        self.worker = Some(handle);
        Ok(())
    }

    /// 停止异步捕获并等待工作线程退出 (可重复调用)
    pub fn stop_capturing(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_capturing();
    }
}

/// 处理一帧: 解码 → 过滤 → 组装结果批
///
/// 空批且无告警时返回 None, 不打扰接收器。
fn process_frame(
    frame: &VideoFrame,
    filter: &mut Option<MultiFrameCrossFilter>,
) -> Option<DecodedBarcodesResult> {
    let output = decoder::decode_frame(frame);

    let status = if output.undecoded > 0 {
        ResultStatus::Warning(format!("{} 个符号定位成功但解码失败", output.undecoded))
    } else {
        ResultStatus::Ok
    };

    let items = match filter {
        Some(f) => f.admit(output.items),
        None => output.items,
    };

    if items.is_empty() && status == ResultStatus::Ok {
        return None;
    }
    Some(DecodedBarcodesResult {
        image_id: frame.image_id,
        status,
        items,
    })
}

/// 按预设模板组装一套完整会话: 输入源 + 过滤器 + 会话
pub fn build_session(
    settings: &EngineSettings,
    receiver: Box<dyn CapturedResultReceiver>,
) -> Result<(VideoFrameSource, CaptureSession)> {
    let source = VideoFrameSource::new(settings);
    let mut session = CaptureSession::new();
    session.set_input(&source)?;
    session.add_result_filter(MultiFrameCrossFilter::new(settings))?;
    session.add_result_receiver(receiver)?;
    Ok((source, session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{BarcodeItem, PixelFormat};
    use std::sync::atomic::AtomicUsize;

    struct CountingReceiver(Arc<AtomicUsize>);

    impl CapturedResultReceiver for CountingReceiver {
        fn on_decoded_barcodes(&self, _result: &DecodedBarcodesResult) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn blank_frame(id: u64) -> VideoFrame {
        VideoFrame {
            data: Arc::new(vec![255u8; 32 * 32 * 3]),
            width: 32,
            height: 32,
            stride: 32 * 3,
            pixel_format: PixelFormat::Rgb888,
            image_id: id,
        }
    }

    #[test]
    fn test_configuration_rejected_while_running() {
        let settings = EngineSettings::default();
        let source = VideoFrameSource::new(&settings);
        let mut session = CaptureSession::new();
        session.set_input(&source).unwrap();
        session.start_capturing(PresetTemplate::ReadBarcodes).unwrap();

        assert!(session.set_input(&source).is_err());
        assert!(session
            .add_result_filter(MultiFrameCrossFilter::new(&settings))
            .is_err());
        assert!(session.start_capturing(PresetTemplate::ReadBarcodes).is_err());

        session.stop_capturing();
    }

    #[test]
    fn test_start_without_input_fails() {
        let mut session = CaptureSession::new();
        assert!(session.start_capturing(PresetTemplate::ReadBarcodes).is_err());
    }

    #[test]
    fn test_stop_is_idempotent_and_joins() {
        let settings = EngineSettings::default();
        let source = VideoFrameSource::new(&settings);
        let mut session = CaptureSession::new();
        session.set_input(&source).unwrap();
        session.start_capturing(PresetTemplate::ReadBarcodes).unwrap();

        source.add_frame(blank_frame(1));
        session.stop_capturing();
        session.stop_capturing();
    }

    #[test]
    fn test_blank_frames_do_not_reach_receivers() {
        let settings = EngineSettings::default();
        let counter = Arc::new(AtomicUsize::new(0));
        let (source, mut session) =
            build_session(&settings, Box::new(CountingReceiver(Arc::clone(&counter)))).unwrap();
        session.start_capturing(PresetTemplate::ReadBarcodes).unwrap();

        for id in 1..=5 {
            source.add_frame(blank_frame(id));
        }
        // 等待工作线程消化队列
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while source.len() > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        session.stop_capturing();
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_process_frame_skips_empty_ok_batches() {
        let frame = blank_frame(3);
        let mut filter = None;
        assert!(process_frame(&frame, &mut filter).is_none());
    }

    #[test]
    fn test_process_frame_keeps_image_id() {
        // 直接构造结果路径: 无过滤器时条目原样通过
        let items = vec![BarcodeItem {
            format: "QR_CODE".into(),
            text: "x".into(),
        }];
        let mut f = Some(MultiFrameCrossFilter::new(&EngineSettings {
            enable_deduplication: false,
            enable_cross_verification: false,
            ..EngineSettings::default()
        }));
        let admitted = f.as_mut().unwrap().admit(items.clone());
        assert_eq!(admitted, items);
    }
}
