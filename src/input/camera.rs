//! 摄像头输入模块 - 本地摄像头抓帧
//!
//! 支持 DirectShow(Windows) / AVFoundation(macOS) / V4L2(Linux)

use super::grab_filter::GrabFilter;
use anyhow::{anyhow, Result};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};

/// 摄像头抓帧器
pub struct CameraGrabber {
    device_index: usize,
    device_name: String,
}

impl CameraGrabber {
    pub fn new(device_index: usize, device_name: String) -> Self {
        Self {
            device_index,
            device_name,
        }
    }

    /// 打开摄像头并抓帧直到源结束或收到停止请求
    pub fn run(&self, filter: GrabFilter) -> Result<()> {
        println!("📷 设备索引: {}", self.device_index);
        println!("📷 设备名称: {}", self.device_name);

        let camera_url = Self::format_camera_url(self.device_index, &self.device_name);
        let format = Self::capture_format();
        println!("🔍 使用格式: {}, 输入: {}", format, camera_url);

        let mut retry_count = 0;
        let max_retries = 3;

        loop {
            let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
            let pipe = pipe.filter("grab", Box::new(filter.clone()));
            let out = create_null_output().add_frame_pipeline(pipe);

            // 注意: 不硬编码分辨率/帧率, 让采集格式自动协商默认值
            let input = Input::new(camera_url.as_str()).set_format(format);

            let ctx_result = FfmpegContext::builder()
                .input(input)
                .filter_desc("format=yuv420p")
                .output(out)
                .build();

            let ctx = match ctx_result {
                Ok(c) => c,
                Err(e) => {
                    retry_count += 1;
                    eprintln!("❌ 摄像头打开失败: {}", e);
                    if retry_count >= max_retries {
                        return Err(anyhow!("无法打开摄像头 (重试{}次): {}", max_retries, e));
                    }
                    println!(
                        "⚠️ 摄像头忙或无法打开, 1秒后重试... ({}/{})",
                        retry_count, max_retries
                    );
                    std::thread::sleep(std::time::Duration::from_secs(1));
                    continue;
                }
            };

            let sch = ctx.start().map_err(|e| anyhow!("摄像头启动失败: {}", e))?;

            println!("✅ 摄像头连接成功, 开始抓帧!");
            let _ = sch.wait();
            println!("📹 摄像头抓帧循环结束");
            return Ok(());
        }
    }

    /// 格式化摄像头URL - 根据平台选择
    fn format_camera_url(index: usize, name: &str) -> String {
        #[cfg(target_os = "windows")]
        {
            let _ = index;
            format!("video={}", name)
        }
        #[cfg(target_os = "macos")]
        {
            let _ = name;
            format!("{}", index)
        }
        #[cfg(target_os = "linux")]
        {
            let _ = name;
            format!("/dev/video{}", index)
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            let _ = name;
            format!("{}", index)
        }
    }

    /// 平台对应的采集格式
    fn capture_format() -> &'static str {
        #[cfg(target_os = "windows")]
        {
            "dshow"
        }
        #[cfg(target_os = "macos")]
        {
            "avfoundation"
        }
        #[cfg(target_os = "linux")]
        {
            "v4l2"
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            "video4linux2"
        }
    }
}

/// 获取可用的摄像头设备列表
pub fn list_camera_devices() -> Vec<(usize, String)> {
    match ez_ffmpeg::device::get_input_video_devices() {
        Ok(devices) => devices.into_iter().enumerate().collect(),
        Err(e) => {
            eprintln!("⚠️ 获取摄像头列表失败: {}", e);
            vec![]
        }
    }
}
