use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::services::base_address::PortRewrite;

/// 服务配置，来自 .env 和环境变量
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    /// 前端页面的默认 origin，创建会话时未提供 origin 则使用它
    pub page_origin: String,
    pub port_rewrite: PortRewrite,
    /// 会话闲置超过该时长即被回收，页面关闭时未必会发出 DELETE
    pub form_ttl: Duration,
    /// 同时存在的会话上限
    pub max_forms: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = PortRewrite::default();
        Ok(Self {
            listen_addr: parse_or(&lookup, "LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            page_origin: lookup("PAGE_ORIGIN").unwrap_or_else(|| "http://localhost:63342".into()),
            port_rewrite: PortRewrite {
                dev_server_port: parse_or(&lookup, "DEV_SERVER_PORT", defaults.dev_server_port)?,
                app_server_port: parse_or(&lookup, "APP_SERVER_PORT", defaults.app_server_port)?,
            },
            form_ttl: Duration::from_secs(parse_or(&lookup, "FORM_TTL_SECS", 1800)?),
            max_forms: parse_or(&lookup, "MAX_FORMS", 1000)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key}={raw}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.page_origin, "http://localhost:63342");
        assert_eq!(config.port_rewrite, PortRewrite::default());
        assert_eq!(config.form_ttl, Duration::from_secs(1800));
        assert_eq!(config.max_forms, 1000);
    }

    #[test]
    fn overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("LISTEN_ADDR", "0.0.0.0:8000"),
            ("PAGE_ORIGIN", "http://localhost:5173"),
            ("DEV_SERVER_PORT", "5173"),
            ("APP_SERVER_PORT", "9090"),
            ("FORM_TTL_SECS", "60"),
            ("MAX_FORMS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr.port(), 8000);
        assert_eq!(config.page_origin, "http://localhost:5173");
        assert_eq!(config.port_rewrite.dev_server_port, 5173);
        assert_eq!(config.port_rewrite.app_server_port, 9090);
        assert_eq!(config.form_ttl, Duration::from_secs(60));
        assert_eq!(config.max_forms, 5);
    }

    #[test]
    fn bad_port_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[("APP_SERVER_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("APP_SERVER_PORT"));

        let err = AppConfig::from_lookup(lookup(&[("FORM_TTL_SECS", "-1")])).unwrap_err();
        assert!(err.to_string().contains("FORM_TTL_SECS"));
    }
}
