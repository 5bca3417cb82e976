/// 预览窗口 (macroquad渲染)
/// Optional preview window; skipped entirely in headless environments
use crate::engine::VideoFrame;
use crate::input;
use crossbeam_channel::{Receiver, TryRecvError};
use macroquad::prelude::*;

pub const WINDOW_TITLE: &str = "Video Barcode Reader";
pub const WINDOW_WIDTH: i32 = 1280;
pub const WINDOW_HEIGHT: i32 = 720;

/// 是否运行在无显示环境
pub fn is_headless() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("DISPLAY").is_none() && std::env::var_os("WAYLAND_DISPLAY").is_none()
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

/// 在主线程运行预览窗口, 窗口关闭或视频源结束后返回
///
/// 返回后由调用方设置全局停止标志, 保证采集线程在一帧内退出。
pub fn run_window(rx: Receiver<VideoFrame>) {
    let conf = Conf {
        window_title: WINDOW_TITLE.to_string(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        window_resizable: true,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, render_loop(rx));
    println!("🖥️ 预览窗口已关闭");
}

async fn render_loop(rx: Receiver<VideoFrame>) {
    let mut texture: Option<Texture2D> = None;
    let mut rgba: Vec<u8> = Vec::new();

    loop {
        // 只保留最新一帧, 渲染端永不反压采集端
        let mut latest: Option<VideoFrame> = None;
        let mut source_gone = false;
        loop {
            match rx.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    source_gone = true;
                    break;
                }
            }
        }

        if let Some(frame) = latest {
            rgb_to_rgba(&frame, &mut rgba);
            texture = Some(Texture2D::from_rgba8(
                frame.width as u16,
                frame.height as u16,
                &rgba,
            ));
        }

        clear_background(BLACK);
        if let Some(tex) = &texture {
            let (dest, offset) = fit_to_screen(
                tex.width(),
                tex.height(),
                screen_width(),
                screen_height(),
            );
            draw_texture_ex(
                tex,
                offset.x,
                offset.y,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(dest),
                    ..Default::default()
                },
            );
        }

        if source_gone {
            // 视频源结束: 不再有新帧, 直接收窗
            break;
        }
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        next_frame().await;
    }
}

/// 等比缩放并居中 (保持视频宽高比)
fn fit_to_screen(tex_w: f32, tex_h: f32, screen_w: f32, screen_h: f32) -> (Vec2, Vec2) {
    let scale = (screen_w / tex_w).min(screen_h / tex_h);
    let dest = vec2(tex_w * scale, tex_h * scale);
    let offset = vec2((screen_w - dest.x) / 2.0, (screen_h - dest.y) / 2.0);
    (dest, offset)
}

/// RGB888帧 → RGBA纹理缓冲 (复用输出缓冲)
fn rgb_to_rgba(frame: &VideoFrame, out: &mut Vec<u8>) {
    let pixel_count = (frame.width * frame.height) as usize;
    out.clear();
    out.reserve(pixel_count * 4);
    let bpp = frame.pixel_format.bytes_per_pixel();
    for y in 0..frame.height as usize {
        let row = y * frame.stride;
        for x in 0..frame.width as usize {
            let idx = row + x * bpp;
            out.push(frame.data[idx]);
            out.push(frame.data[idx + 1]);
            out.push(frame.data[idx + 2]);
            out.push(255);
        }
    }
}

/// 窗口退出后的善后: 通知采集线程停止
pub fn shutdown() {
    input::request_stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PixelFormat;
    use std::sync::Arc;

    #[test]
    fn test_fit_wide_video_letterboxes_vertically() {
        let (dest, offset) = fit_to_screen(1920.0, 1080.0, 1280.0, 1280.0);
        assert_eq!(dest.x, 1280.0);
        assert_eq!(offset.x, 0.0);
        assert!(offset.y > 0.0);
    }

    #[test]
    fn test_rgb_to_rgba_adds_opaque_alpha() {
        let frame = VideoFrame {
            data: Arc::new(vec![1, 2, 3, 4, 5, 6]),
            width: 2,
            height: 1,
            stride: 6,
            pixel_format: PixelFormat::Rgb888,
            image_id: 1,
        };
        let mut out = Vec::new();
        rgb_to_rgba(&frame, &mut out);
        assert_eq!(out, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
