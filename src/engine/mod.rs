/// 条码捕获引擎 (Barcode Capture Engine)
///
/// 对第三方解码库的会话式封装, 驱动程序只与这一层交互:
/// - VideoFrameSource: 帧输入队列 (带溢出保护)
/// - CaptureSession:   启动/停止异步捕获, 分发结果
/// - MultiFrameCrossFilter: 跨帧去重与交叉验证
/// - decoder: 逐帧调用 rqrr 解码 (黑盒, 不实现任何算法)
pub mod adapter;
pub mod decoder;
pub mod filter;
pub mod session;
pub mod settings;
pub mod types;

pub use adapter::VideoFrameSource;
pub use filter::MultiFrameCrossFilter;
pub use session::{build_session, CaptureSession};
pub use settings::{BufferOverflowProtection, EngineSettings, PresetTemplate};
pub use types::{
    BarcodeItem, CapturedResultReceiver, DecodedBarcodesResult, PixelFormat, ResultStatus,
    VideoFrame,
};
