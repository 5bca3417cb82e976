/// 帧输入适配器 - 引擎的输入队列
/// Frame input adapter: the engine side drains, the grab side feeds
use super::settings::{BufferOverflowProtection, EngineSettings};
use super::types::VideoFrame;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// 视频帧源: 采集线程通过它向引擎提交帧
///
/// 句柄可Clone; 所有Sender克隆都释放后, 引擎侧收到断开信号即视为输入结束。
#[derive(Clone)]
pub struct VideoFrameSource {
    tx: Sender<VideoFrame>,
    rx: Receiver<VideoFrame>,
    mode: BufferOverflowProtection,
}

impl VideoFrameSource {
    pub fn new(settings: &EngineSettings) -> Self {
        let (tx, rx) = bounded::<VideoFrame>(settings.max_image_count);
        Self {
            tx,
            rx,
            mode: settings.overflow_protection,
        }
    }

    /// 引擎工作线程持有的消费端
    pub fn receiver(&self) -> Receiver<VideoFrame> {
        self.rx.clone()
    }

    /// 当前排队帧数
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// 按溢出保护模式提交一帧
    ///
    /// Update/DropNew 模式下从不阻塞采集线程。
    /// 返回 false 表示队列已断开, 采集侧应停止提交。
    pub fn add_frame(&self, frame: VideoFrame) -> bool {
        match self.mode {
            BufferOverflowProtection::Block => self.tx.send(frame).is_ok(),
            BufferOverflowProtection::DropNew => match self.tx.try_send(frame) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => true, // 新帧直接丢弃
                Err(TrySendError::Disconnected(_)) => false,
            },
            BufferOverflowProtection::Update => {
                let mut frame = frame;
                loop {
                    match self.tx.try_send(frame) {
                        Ok(()) => return true,
                        Err(TrySendError::Full(f)) => {
                            // 丢弃最旧的一帧, 为新帧腾出空间
                            let _ = self.rx.try_recv();
                            frame = f;
                        }
                        Err(TrySendError::Disconnected(_)) => return false,
                    }
                }
            }
        }
    }
}
