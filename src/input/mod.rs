/// 视频输入系统 (Video Input System)
///
/// 独立采集线程, 负责视频源打开与逐帧提交
/// - CameraGrabber: 本地摄像头抓帧 (DirectShow/AVFoundation/V4L2)
/// - FileGrabber:   视频文件抓帧
/// - GrabFilter:    帧校验/转换/序号分配/入队
pub mod camera;
pub mod file;
pub mod grab_filter;

pub use camera::{list_camera_devices, CameraGrabber};
pub use file::FileGrabber;
pub use grab_filter::GrabFilter;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// 全局停止标志 (窗口关闭 → 采集线程)
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// 请求停止采集 (幂等)
pub fn request_stop() {
    STOP_REQUESTED.store(true, Ordering::Relaxed);
}

/// 采集线程逐帧检查的停止标志
pub fn stop_requested() -> bool {
    STOP_REQUESTED.load(Ordering::Relaxed)
}

/// 视频源: 摄像头或视频文件
#[derive(Debug, Clone)]
pub enum InputSource {
    Camera { index: usize, name: String },
    File(PathBuf),
}

impl InputSource {
    /// 打开源并抓帧直到结束 (采集线程入口)
    pub fn run(&self, filter: GrabFilter) -> Result<()> {
        match self {
            InputSource::Camera { index, name } => {
                CameraGrabber::new(*index, name.clone()).run(filter)
            }
            InputSource::File(path) => FileGrabber::new(path).run(filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_flag_round_trip() {
        assert!(!stop_requested());
        request_stop();
        assert!(stop_requested());
        STOP_REQUESTED.store(false, Ordering::Relaxed);
    }
}
