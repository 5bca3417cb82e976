#![allow(clippy::type_complexity)]
pub mod console; // 控制台驱动 (模式选择与结果打印)
pub mod engine; // 条码捕获引擎封装
pub mod input; // 视频输入系统
pub mod render; // 预览窗口

pub use crate::engine::{
    BarcodeItem, CaptureSession, CapturedResultReceiver, DecodedBarcodesResult, EngineSettings,
    MultiFrameCrossFilter, PresetTemplate, ResultStatus, VideoFrame, VideoFrameSource,
};
pub use crate::input::{GrabFilter, InputSource};
