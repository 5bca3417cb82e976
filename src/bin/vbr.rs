/// 视频条码识别 (Video Barcode Reader)
///
/// 系统架构:
/// 1. 采集线程: 摄像头/视频文件解码 → RGB888帧 → 引擎输入队列
/// 2. 引擎线程: 帧解码 + 跨帧过滤 → 异步回调结果接收器
/// 3. 主线程:   预览窗口渲染 (无显示环境下直接等待采集结束)
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use video_barcode_rs::console::{self, ConsoleResultReceiver};
use video_barcode_rs::engine::{build_session, EngineSettings, PresetTemplate, VideoFrame};
use video_barcode_rs::input::{self, GrabFilter, InputSource};
use video_barcode_rs::render;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// 视频条码识别参数
#[derive(Parser, Debug)]
#[command(author, version, about = "视频条码识别 - 摄像头/视频文件实时解码", long_about = None)]
struct Args {
    /// 视频文件路径 (给定后直接进入文件模式)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// 摄像头设备索引 (给定后直接进入摄像头模式)
    #[arg(short, long)]
    camera: Option<usize>,

    /// 禁用预览窗口
    #[arg(long)]
    no_window: bool,

    /// 引擎预设模板JSON文件 (默认使用内置 read-barcodes 模板)
    #[arg(long)]
    template: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("------------------- start ------------------------");
    println!(
        "🚀 视频条码识别启动 | {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    // 运行失败也走完收尾提示 (与交互式样例一致, 错误已即时打印)
    if let Err(e) = run(&args) {
        eprintln!("❌ 错误: {:#}", e);
    }

    println!("------------------- over -------------------------");
    print!("Press Enter to quit...");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok();

    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    // 引擎参数: 内置预设或JSON模板
    let settings = match &args.template {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            EngineSettings::from_json(&json)?
        }
        None => EngineSettings::preset(PresetTemplate::ReadBarcodes),
    };

    // 选择视频源: 命令行直达或交互式菜单
    let source = match (&args.file, args.camera) {
        (Some(path), _) => {
            if !path.exists() {
                anyhow::bail!("File not found: {}", path.display());
            }
            InputSource::File(path.clone())
        }
        (None, Some(index)) => {
            let name = input::list_camera_devices()
                .into_iter()
                .find(|(i, _)| *i == index)
                .map(|(_, n)| n)
                .unwrap_or_else(|| String::from("default"));
            InputSource::Camera { index, name }
        }
        (None, None) => {
            let stdin = std::io::stdin();
            match console::choose_source(&mut stdin.lock()) {
                Some(s) => s,
                None => return Ok(()), // EOF, 用户放弃
            }
        }
    };

    // 组装引擎会话: 配置错误直接上抛, 不静默吞掉
    let (frame_source, mut session) = build_session(&settings, Box::new(ConsoleResultReceiver))?;
    session.start_capturing(PresetTemplate::ReadBarcodes)?;

    // 预览通道 (尽力而为, 渲染端落后即丢帧)
    let use_window = !args.no_window && !render::is_headless();
    let (preview_tx, preview_rx) = crossbeam_channel::bounded::<VideoFrame>(4);
    let preview = use_window.then_some(preview_tx);

    // 采集线程
    let grab_filter = GrabFilter::new(frame_source.clone(), preview);
    drop(frame_source); // 采集侧持有唯一的生产端, 采集结束即输入结束
    let grab_source = source.clone();
    let grab_handle = std::thread::spawn(move || {
        if let Err(e) = grab_source.run(grab_filter) {
            eprintln!("❌ 采集失败: {:#}", e);
        }
    });

    // 主线程: 预览窗口或等待采集结束
    if use_window {
        render::run_window(preview_rx);
        render::shutdown(); // 窗口关闭 → 采集线程在一帧内退出
    } else {
        println!("🖥️ 无显示环境或已禁用窗口, 跳过预览");
        drop(preview_rx);
    }

    let _ = grab_handle.join();
    session.stop_capturing();
    println!("✅ 本次运行结束");
    Ok(())
}
