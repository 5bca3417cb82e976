/// 帧解码 - 调用第三方条码引擎
/// Per-frame decode via the third-party barcode crate (rqrr)
use super::types::{BarcodeItem, VideoFrame};
use image::GrayImage;

/// 单帧的解码产出: 成功条目 + 定位到但解不出的符号数
pub struct FrameDecodeOutput {
    pub items: Vec<BarcodeItem>,
    pub undecoded: usize,
}

/// 将RGB帧转为灰度图 (条码引擎的输入)
pub fn to_grayscale(frame: &VideoFrame) -> GrayImage {
    GrayImage::from_fn(frame.width, frame.height, |x, y| {
        image::Luma([frame.luma_at(x, y)])
    })
}

/// 解码一帧中的所有条码符号
///
/// 符号检测与解码完全委托给 rqrr, 这里不做任何图像算法。
/// 定位到但解码失败的符号只计数, 不中断整帧处理。
pub fn decode_frame(frame: &VideoFrame) -> FrameDecodeOutput {
    let gray = to_grayscale(frame);
    let (w, h) = gray.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        gray.get_pixel(x as u32, y as u32)[0]
    });

    let mut items = Vec::new();
    let mut undecoded = 0;
    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_meta, text)) => items.push(BarcodeItem {
                format: "QR_CODE".to_string(),
                text,
            }),
            Err(_) => undecoded += 1,
        }
    }

    FrameDecodeOutput { items, undecoded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::PixelFormat;
    use std::sync::Arc;

    fn uniform_frame(width: u32, height: u32, rgb: [u8; 3]) -> VideoFrame {
        let mut data = Vec::with_capacity((width * height) as usize * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        VideoFrame {
            data: Arc::new(data),
            width,
            height,
            stride: width as usize * 3,
            pixel_format: PixelFormat::Rgb888,
            image_id: 1,
        }
    }

    #[test]
    fn test_grayscale_dimensions_match_frame() {
        let frame = uniform_frame(64, 48, [120, 60, 200]);
        let gray = to_grayscale(&frame);
        assert_eq!(gray.dimensions(), (64, 48));
    }

    #[test]
    fn test_blank_frame_decodes_nothing() {
        let frame = uniform_frame(64, 64, [255, 255, 255]);
        let out = decode_frame(&frame);
        assert!(out.items.is_empty());
        assert_eq!(out.undecoded, 0);
    }
}
