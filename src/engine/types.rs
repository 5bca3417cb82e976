use std::sync::Arc;
/// 条码识别引擎数据结构定义
/// Data structures for the barcode capture engine

// ========== 枚举类型 ==========

/// 像素格式 (目前采集侧只产出 RGB888)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb888,
}

impl PixelFormat {
    /// 每像素字节数
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb888 => 3,
        }
    }
}

/// 单批结果的状态 (原始错误码的 OK / 警告 / 错误 三分)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultStatus {
    Ok,
    Warning(String),
    Error(String),
}

// ========== 数据结构 ==========

/// 视频帧 (采集线程 → 引擎工作线程)
#[derive(Clone)]
pub struct VideoFrame {
    pub data: Arc<Vec<u8>>, // 使用Arc共享数据,避免复制
    pub width: u32,
    pub height: u32,
    pub stride: usize, // 每行字节数
    pub pixel_format: PixelFormat,
    pub image_id: u64, // 帧序号, 从1开始严格递增
}

impl VideoFrame {
    /// 读取 (x, y) 处像素的灰度值 (BT.601 整数近似)
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        let idx = y as usize * self.stride + x as usize * self.pixel_format.bytes_per_pixel();
        let r = self.data[idx] as u32;
        let g = self.data[idx + 1] as u32;
        let b = self.data[idx + 2] as u32;
        ((r * 77 + g * 150 + b * 29) >> 8) as u8
    }
}

/// 单个解码出的条码条目
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarcodeItem {
    pub format: String, // 例如 "QR_CODE"
    pub text: String,
}

/// 一批解码结果 (引擎工作线程 → 结果接收器)
#[derive(Debug, Clone)]
pub struct DecodedBarcodesResult {
    pub image_id: u64,
    pub status: ResultStatus,
    pub items: Vec<BarcodeItem>,
}

/// 结果接收器接口
///
/// 引擎工作线程在每批帧处理完成后异步调用, 调用顺序与提交顺序无关。
/// 实现只应做对并发打印安全的事情, 不得依赖批次间的先后关系。
pub trait CapturedResultReceiver: Send {
    fn on_decoded_barcodes(&self, result: &DecodedBarcodesResult);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_frame(pixels: &[[u8; 3]], width: u32) -> VideoFrame {
        let data: Vec<u8> = pixels.iter().flatten().copied().collect();
        let height = pixels.len() as u32 / width;
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
    fn test_luma_black_and_white() {
        let frame = rgb_frame(&[[0, 0, 0], [255, 255, 255]], 2);
        assert_eq!(frame.luma_at(0, 0), 0);
        assert_eq!(frame.luma_at(1, 0), 255);
    }

    #[test]
    fn test_luma_weights_green_heaviest() {
        let frame = rgb_frame(&[[255, 0, 0], [0, 255, 0], [0, 0, 255]], 3);
        let r = frame.luma_at(0, 0);
        let g = frame.luma_at(1, 0);
        let b = frame.luma_at(2, 0);
        assert!(g > r);
        assert!(r > b);
    }

    #[test]
    fn test_luma_respects_stride_padding() {
        // 2x2 图像, 每行尾部带2字节填充
        let data = vec![
            10, 10, 10, 200, 200, 200, 0, 0, // 第一行 + padding
            30, 30, 30, 90, 90, 90, 0, 0, // 第二行 + padding
        ];
        let frame = VideoFrame {
            data: Arc::new(data),
            width: 2,
            height: 2,
            stride: 8,
            pixel_format: PixelFormat::Rgb888,
            image_id: 1,
        };
        assert_eq!(frame.luma_at(0, 1), 30);
        assert_eq!(frame.luma_at(1, 1), 90);
    }
}
