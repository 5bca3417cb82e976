//! 视频文件输入模块 - 从本地视频文件抓帧

use super::grab_filter::GrabFilter;
use anyhow::{anyhow, Result};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext};
use std::path::{Path, PathBuf};

/// 视频文件抓帧器
pub struct FileGrabber {
    path: PathBuf,
}

impl FileGrabber {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 打开视频文件并抓帧直到文件结束或收到停止请求
    pub fn run(&self, filter: GrabFilter) -> Result<()> {
        println!("🎞️ 视频文件: {}", self.path.display());

        let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
        let pipe = pipe.filter("grab", Box::new(filter));
        let out = create_null_output().add_frame_pipeline(pipe);

        let path = self
            .path
            .to_str()
            .ok_or_else(|| anyhow!("文件路径不是合法UTF-8: {}", self.path.display()))?;

        let ctx = FfmpegContext::builder()
            .input(path)
            .filter_desc("format=yuv420p")
            .output(out)
            .build()
            .map_err(|e| anyhow!("视频文件打开失败: {}", e))?;

        let sch = ctx.start().map_err(|e| anyhow!("视频解码启动失败: {}", e))?;

        println!("✅ 视频文件打开成功, 开始抓帧!");
        let _ = sch.wait();
        println!("🎞️ 视频文件抓帧结束");
        Ok(())
    }
}
