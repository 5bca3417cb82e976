/// FFmpeg帧抓取过滤器: 视频源 → RGB888帧 → 引擎输入队列
/// FFmpeg grab filter: validates frames, converts to RGB888, submits to the engine
use crate::engine::{PixelFormat, VideoFrame, VideoFrameSource};
use crate::input;
use crossbeam_channel::{Sender, TrySendError};
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use std::sync::Arc;
use std::time::Instant;

/// 帧抓取过滤器
///
/// 每个提交成功的帧消耗一个序号, 序号从1开始逐帧+1;
/// 校验失败被丢弃的帧不占用序号。
#[derive(Clone)]
pub struct GrabFilter {
    engine: VideoFrameSource,
    preview: Option<Sender<VideoFrame>>,
    next_image_id: u64,
    count: usize,
    last: Instant,
    current_fps: f64,
    dropped_frames: usize,
    total_frames: usize,
}

impl GrabFilter {
    pub fn new(engine: VideoFrameSource, preview: Option<Sender<VideoFrame>>) -> Self {
        Self {
            engine,
            preview,
            next_image_id: 0,
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
            dropped_frames: 0,
            total_frames: 0,
        }
    }

    /// 提交一个转换完成的RGB888缓冲 (分配帧序号)
    fn submit_buffer(&mut self, rgb: Vec<u8>, width: u32, height: u32) -> Result<(), String> {
        self.next_image_id += 1;
        let frame = VideoFrame {
            data: Arc::new(rgb),
            width,
            height,
            stride: width as usize * 3,
            pixel_format: PixelFormat::Rgb888,
            image_id: self.next_image_id,
        };

        if !self.engine.add_frame(frame.clone()) {
            return Err("引擎输入队列已断开".to_string());
        }

        // 预览是尽力而为: 渲染端跟不上就丢帧
        if let Some(tx) = self.preview.take() {
            match tx.try_send(frame) {
                Ok(()) | Err(TrySendError::Full(_)) => self.preview = Some(tx),
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
        Ok(())
    }
}

impl FrameFilter for GrabFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        println!("✅ 采集线程启动");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        // 窗口关闭等停止请求: 返回错误终止FFmpeg调度循环
        if input::stop_requested() {
            println!("🛑 收到停止请求, 结束采集");
            return Err("stop requested".to_string());
        }

        unsafe {
            self.total_frames += 1;

            // 基本检查: 空帧或损坏帧
            if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                self.dropped_frames += 1;
                if self.total_frames <= 10 {
                    println!("⚠️ 丢弃帧 #{}: 空帧/损坏帧", self.total_frames);
                }
                return Ok(None);
            }

            let w = (*frame.as_ptr()).width as u32;
            let h = (*frame.as_ptr()).height as u32;

            // 检查分辨率合法性
            if w == 0 || h == 0 || w > 4096 || h > 4096 {
                self.dropped_frames += 1;
                if self.total_frames <= 10 {
                    println!("⚠️ 丢弃帧 #{}: 非法分辨率 {}x{}", self.total_frames, w, h);
                }
                return Ok(None);
            }

            // 检查FFmpeg错误标志位: 只丢弃严重错误的帧
            let decode_error_flags = (*frame.as_ptr()).decode_error_flags;
            if decode_error_flags & 0x03 != 0 {
                self.dropped_frames += 1;
                if self.total_frames <= 10 {
                    println!(
                        "⚠️ 丢弃帧 #{}: 解码错误标志=0x{:02x}",
                        self.total_frames, decode_error_flags
                    );
                }
                return Ok(None);
            }

            // YUV420P数据指针
            let y_plane = (*frame.as_ptr()).data[0];
            let u_plane = (*frame.as_ptr()).data[1];
            let v_plane = (*frame.as_ptr()).data[2];
            let y_stride = (*frame.as_ptr()).linesize[0] as usize;
            let uv_stride = (*frame.as_ptr()).linesize[1] as usize;

            if y_plane.is_null() || u_plane.is_null() || v_plane.is_null() {
                self.dropped_frames += 1;
                if self.total_frames <= 10 {
                    println!("⚠️ 丢弃帧 #{}: YUV指针为空", self.total_frames);
                }
                return Ok(None);
            }

            if y_stride < w as usize || uv_stride < (w as usize / 2) {
                self.dropped_frames += 1;
                if self.total_frames <= 10 {
                    println!(
                        "⚠️ 丢弃帧 #{}: 步长异常 y_stride={} uv_stride={}",
                        self.total_frames, y_stride, uv_stride
                    );
                }
                return Ok(None);
            }

            self.count += 1;

            // YUV420P → RGB888 (引擎侧帧会排队, 每帧独立缓冲)
            let mut rgb = vec![0u8; (w * h) as usize * 3];
            yuv420p_to_rgb_scalar(
                y_plane,
                u_plane,
                v_plane,
                y_stride,
                uv_stride,
                &mut rgb,
                w as usize,
                h as usize,
            );

            // 每秒打印一次采集统计
            if self.last.elapsed().as_secs_f64() >= 1.0 {
                let elapsed = self.last.elapsed().as_secs_f64();
                self.current_fps = self.count as f64 / elapsed;
                let drop_rate = self.dropped_frames as f64 / self.total_frames as f64 * 100.0;
                println!(
                    "📺 采集统计: {:.1}fps | 已提交{}帧 | 总帧{} | 丢弃{} ({:.1}%)",
                    self.current_fps,
                    self.next_image_id,
                    self.total_frames,
                    self.dropped_frames,
                    drop_rate
                );
                self.last = Instant::now();
                self.count = 0;
            }

            self.submit_buffer(rgb, w, h)?;
            Ok(Some(frame))
        }
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        println!("✅ 采集线程退出 | 共提交 {} 帧", self.next_image_id);
    }
}

/// 标量版本YUV420P→RGB888转换 (BT.601整数近似)
#[inline]
unsafe fn yuv420p_to_rgb_scalar(
    y_plane: *const u8,
    u_plane: *const u8,
    v_plane: *const u8,
    y_stride: usize,
    uv_stride: usize,
    buffer: &mut [u8],
    width: usize,
    height: usize,
) {
    let mut out_idx = 0;
    for y in 0..height {
        let y_row = y * y_stride;
        let uv_row = (y >> 1) * uv_stride;

        for x in 0..width {
            let y_val = *y_plane.add(y_row + x) as i32;
            let u_val = *u_plane.add(uv_row + (x >> 1)) as i32 - 128;
            let v_val = *v_plane.add(uv_row + (x >> 1)) as i32 - 128;

            buffer[out_idx] = (y_val + ((v_val * 179) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 1] =
                (y_val - ((u_val * 44) >> 7) - ((v_val * 91) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 2] = (y_val + ((u_val * 227) >> 7)).clamp(0, 255) as u8;
            out_idx += 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSettings;
    use crossbeam_channel::bounded;

    fn filter_with_capacity(capacity: usize) -> (GrabFilter, VideoFrameSource) {
        let settings = EngineSettings {
            max_image_count: capacity,
            ..EngineSettings::default()
        };
        let source = VideoFrameSource::new(&settings);
        (GrabFilter::new(source.clone(), None), source)
    }

    #[test]
    fn test_image_ids_strictly_increase_from_one() {
        let (mut filter, source) = filter_with_capacity(16);
        for _ in 0..5 {
            filter.submit_buffer(vec![0u8; 12], 2, 2).unwrap();
        }
        let rx = source.receiver();
        for expected in 1..=5u64 {
            assert_eq!(rx.recv().unwrap().image_id, expected);
        }
    }

    #[test]
    fn test_overflow_does_not_break_sequence() {
        // Update模式下溢出丢最旧帧, 幸存帧序号仍严格递增
        let (mut filter, source) = filter_with_capacity(2);
        for _ in 0..6 {
            filter.submit_buffer(vec![0u8; 12], 2, 2).unwrap();
        }
        let rx = source.receiver();
        assert_eq!(rx.recv().unwrap().image_id, 5);
        assert_eq!(rx.recv().unwrap().image_id, 6);
    }

    #[test]
    fn test_preview_full_does_not_block_submission() {
        let settings = EngineSettings::default();
        let source = VideoFrameSource::new(&settings);
        let (tx, _rx) = bounded::<VideoFrame>(1);
        let mut filter = GrabFilter::new(source.clone(), Some(tx));
        for _ in 0..4 {
            filter.submit_buffer(vec![0u8; 12], 2, 2).unwrap();
        }
        assert_eq!(source.len(), 4);
    }

    #[test]
    fn test_preview_disconnect_drops_sender() {
        let settings = EngineSettings::default();
        let source = VideoFrameSource::new(&settings);
        let (tx, rx) = bounded::<VideoFrame>(1);
        let mut filter = GrabFilter::new(source, Some(tx));
        drop(rx);
        filter.submit_buffer(vec![0u8; 12], 2, 2).unwrap();
        assert!(filter.preview.is_none());
    }
}
