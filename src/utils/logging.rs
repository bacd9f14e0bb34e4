use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEBUG_ENV: &str = "AGENT_STUDIO_DEBUG";

/// 日志配置
pub struct LoggingConfig;

impl LoggingConfig {
    /// 初始化日志系统
    ///
    /// 支持通过环境变量配置：
    /// - RUST_LOG: 设置日志级别（error, warn, info, debug, trace）
    /// - AGENT_STUDIO_DEBUG: 启用详细调试输出
    ///
    /// 使用示例：
    /// ```no_run
    /// use agentstudio::utils::LoggingConfig;
    ///
    /// fn main() {
    ///     LoggingConfig::init();
    /// }
    /// ```
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new(Self::default_filter(is_debug)),
        };

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(is_debug)
            .with_file(is_debug)
            .with_line_number(is_debug);

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();

        if is_debug {
            tracing::debug!("debug logging enabled");
        }
    }

    /// 初始化日志系统（带自定义过滤器）
    pub fn init_with_filter(filter: &str) {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(filter))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
    }

    /// 检查是否启用调试模式
    pub fn is_debug() -> bool {
        env::var(DEBUG_ENV).is_ok()
    }

    fn default_filter(is_debug: bool) -> &'static str {
        if is_debug {
            "agentstudio=debug,info"
        } else {
            "agentstudio=info,warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_debug() {
        env::remove_var(DEBUG_ENV);
        assert!(!LoggingConfig::is_debug());

        env::set_var(DEBUG_ENV, "1");
        assert!(LoggingConfig::is_debug());

        env::remove_var(DEBUG_ENV);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(LoggingConfig::default_filter(true), "agentstudio=debug,info");
        assert_eq!(LoggingConfig::default_filter(false), "agentstudio=info,warn");
    }
}
