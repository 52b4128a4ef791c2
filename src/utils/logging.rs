/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// `RUST_LOG` 优先，其次使用配置中的默认级别。重复调用是安全的。
pub fn init(config: &Config) {
    let default_level = if config.verbose_logging {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, module_count: usize, quiz_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 学习平台核心");
    info!("📚 课程目录: {}", config.catalog_path);
    info!("📊 模块: {} 个, 测验: {} 个", module_count, quiz_count);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("مرحبا بالعالم", 5), "مرحبا...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
