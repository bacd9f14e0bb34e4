use std::env;
use std::str::FromStr;

use crate::error::{Result, StudioError};

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 解析密钥：`${VAR_NAME}` 形式从环境变量读取，否则原样返回
    pub fn resolve_secret(value: &str) -> Result<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let env_var_name = &value[2..value.len() - 1];
            Self::get_env(env_var_name)
        } else {
            Ok(value.to_string())
        }
    }

    /// 从环境变量获取值
    pub fn get_env(key: &str) -> Result<String> {
        env::var(key).map_err(|_| {
            StudioError::Config(format!("environment variable `{key}` is not set"))
        })
    }

    /// 获取可选的环境变量，空值视为未设置
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    /// 读取并解析可选的环境变量
    pub fn parse_env<T>(key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::get_env_optional(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| StudioError::Config(format!("invalid value for `{key}`: {e}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_secret_direct() {
        let result = EnvConfig::resolve_secret("token-1234");
        assert_eq!(result.unwrap(), "token-1234");
    }

    #[test]
    fn test_resolve_secret_env_var() {
        env::set_var("TEST_STUDIO_SECRET", "secret_value");
        let result = EnvConfig::resolve_secret("${TEST_STUDIO_SECRET}");
        assert_eq!(result.unwrap(), "secret_value");
        env::remove_var("TEST_STUDIO_SECRET");
    }

    #[test]
    fn test_resolve_secret_missing_env_var() {
        let result = EnvConfig::resolve_secret("${TEST_STUDIO_SECRET_MISSING}");
        assert!(matches!(result, Err(StudioError::Config(_))));
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        env::set_var("TEST_STUDIO_NUMBER", "abc");
        let result = EnvConfig::parse_env::<u64>("TEST_STUDIO_NUMBER");
        assert!(matches!(result, Err(StudioError::Config(_))));
        env::remove_var("TEST_STUDIO_NUMBER");
    }
}
