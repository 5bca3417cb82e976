/// 控制台驱动 - 交互式模式选择与结果打印
/// Console driver: interactive source selection + result printing
use crate::engine::{CapturedResultReceiver, DecodedBarcodesResult, ResultStatus};
use crate::input::{list_camera_devices, InputSource};
use std::io::BufRead;
use std::path::Path;

/// 菜单一行输入的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    /// 空行, 重新提示
    Empty,
    /// 1 = 摄像头
    Camera,
    /// 2 = 视频文件
    File,
    /// 非数字输入按文件路径处理 (去掉包裹引号)
    DirectPath(String),
    /// 其他数字, 无效
    Invalid,
}

/// 解析菜单输入行 (纯函数, 单测覆盖重试属性)
pub fn parse_menu_line(line: &str) -> MenuChoice {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return MenuChoice::Empty;
    }
    match trimmed.parse::<i32>() {
        Ok(1) => MenuChoice::Camera,
        Ok(2) => MenuChoice::File,
        Ok(_) => MenuChoice::Invalid,
        Err(_) => MenuChoice::DirectPath(strip_quotes(trimmed).to_string()),
    }
}

/// 去掉路径两端的包裹引号
pub fn strip_quotes(s: &str) -> &str {
    s.trim_start_matches('"').trim_end_matches('"')
}

fn print_menu() {
    println!(">> 选择模式 (Choose a mode):");
    println!("1. 摄像头实时解码 (Decode from camera)");
    println!("2. 视频文件解码 (Decode from file)");
    println!(">> 输入 1 或 2:");
}

/// 交互式选择视频源
///
/// 无效输入循环重试; 输入流结束 (EOF) 返回 None。
pub fn choose_source<R: BufRead>(input: &mut R) -> Option<InputSource> {
    let mut line = String::new();
    loop {
        print_menu();
        line.clear();
        if input.read_line(&mut line).ok()? == 0 {
            return None;
        }

        match parse_menu_line(&line) {
            MenuChoice::Empty => continue,
            MenuChoice::Camera => return Some(pick_camera()),
            MenuChoice::File => match prompt_file_path(input) {
                Some(path) => return Some(InputSource::File(path.into())),
                None => return None,
            },
            MenuChoice::DirectPath(path) => {
                if Path::new(&path).exists() {
                    return Some(InputSource::File(path.into()));
                }
                println!("❌ Error: File not found");
            }
            MenuChoice::Invalid => {
                println!("❌ Error: Wrong input.");
            }
        }
    }
}

/// 枚举设备并选用第一个摄像头
fn pick_camera() -> InputSource {
    let devices = list_camera_devices();
    for (index, name) in &devices {
        println!("   [{}] {}", index, name);
    }
    match devices.into_iter().next() {
        Some((index, name)) => InputSource::Camera { index, name },
        None => {
            println!("⚠️ 未枚举到摄像头设备, 尝试默认设备 0");
            InputSource::Camera {
                index: 0,
                name: String::from("default"),
            }
        }
    }
}

/// 循环提示视频文件路径, 直到文件存在; EOF 返回 None
fn prompt_file_path<R: BufRead>(input: &mut R) -> Option<String> {
    let mut line = String::new();
    loop {
        println!(">> 输入视频文件完整路径:");
        line.clear();
        if input.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let path = strip_quotes(line.trim());
        if path.is_empty() {
            continue;
        }
        if Path::new(path).exists() {
            return Some(path.to_string());
        }
        println!("❌ Error: File not found");
    }
}

// ========== 结果打印 ==========

/// 控制台结果接收器: 引擎工作线程回调, 只做格式化打印
pub struct ConsoleResultReceiver;

impl CapturedResultReceiver for ConsoleResultReceiver {
    fn on_decoded_barcodes(&self, result: &DecodedBarcodesResult) {
        // 整批一次println, 避免与采集统计行交错撕裂
        println!("{}", format_result(result));
    }
}

/// 格式化一批解码结果 (纯函数)
pub fn format_result(result: &DecodedBarcodesResult) -> String {
    let mut out = String::new();
    match &result.status {
        ResultStatus::Ok => {}
        ResultStatus::Warning(msg) => {
            out.push_str(&format!("⚠️ 警告: {}\n", msg));
        }
        ResultStatus::Error(msg) => {
            out.push_str(&format!("❌ 错误: {}\n", msg));
        }
    }
    out.push_str(&format!(
        "📋 ImageId: {} | 解码到 {} 个条码",
        result.image_id,
        result.items.len()
    ));
    for (index, item) in result.items.iter().enumerate() {
        out.push_str(&format!(
            "\n   [{}] 格式: {} | 内容: {}",
            index + 1,
            item.format,
            item.text
        ));
    }
    out
}
