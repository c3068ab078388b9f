//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SWITCHBOARD__*` 覆盖（双下划线表示嵌套，如
//! `SWITCHBOARD__APP__RECURSION_LIMIT=10`）。最后用旧式变量补齐：
//! `PLANNER_AGENT_SERVICE_URL` / `SOCIAL_AGENT_SERVICE_URL` / `PLATFORM_AGENT_SERVICE_URL`
//! 只填补未配置的专家地址，`PORT` 覆盖监听端口。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::SetupError;
use crate::dispatch::SpecialistKind;

/// 默认迭代上限（路由/专家往返次数）
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// 应用配置根
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub specialists: SpecialistsSection,
    pub server: ServerSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 路由/专家往返上限，超过即以资源耗尽错误结束
    pub recursion_limit: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

/// [llm] 段：后端选择、采样温度与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// openai / deepseek / mock
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            base_url: None,
            temperature: 0.3,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次路由调用超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [specialists] 段：各专家服务的基地址与调用超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpecialistsSection {
    pub planner_url: Option<String>,
    pub social_url: Option<String>,
    pub platform_url: Option<String>,
    /// 单次专家调用超时（秒）
    pub timeout_secs: u64,
}

impl Default for SpecialistsSection {
    fn default() -> Self {
        Self {
            planner_url: None,
            social_url: None,
            platform_url: None,
            timeout_secs: 120,
        }
    }
}

impl SpecialistsSection {
    /// 专家地址；空字符串视为未配置
    pub fn url_for(&self, kind: SpecialistKind) -> Option<&str> {
        let url = match kind {
            SpecialistKind::Planner => &self.planner_url,
            SpecialistKind::Social => &self.social_url,
            SpecialistKind::Platform => &self.platform_url,
        };
        url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    fn slot_mut(&mut self, kind: SpecialistKind) -> &mut Option<String> {
        match kind {
            SpecialistKind::Planner => &mut self.planner_url,
            SpecialistKind::Social => &mut self.social_url,
            SpecialistKind::Platform => &mut self.platform_url,
        }
    }
}

/// [server] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSection {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// 用旧式环境变量补齐（lookup 便于测试注入）
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for kind in SpecialistKind::ALL {
            if self.specialists.url_for(kind).is_none() {
                if let Some(url) = lookup(kind.legacy_env_var()).filter(|u| !u.trim().is_empty()) {
                    *self.specialists.slot_mut(kind) = Some(url);
                }
            }
        }

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) if p > 0 => self.server.port = p,
                _ => tracing::warn!(
                    "Invalid PORT value '{}', keeping {}",
                    port,
                    self.server.port
                ),
            }
        }
    }

    /// 启动期校验：非法值直接拒绝启动
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.app.recursion_limit == 0 {
            return Err(SetupError::InvalidConfig(
                "app.recursion_limit must be at least 1".to_string(),
            ));
        }
        if self.llm.timeouts.request == 0 {
            return Err(SetupError::InvalidConfig(
                "llm.timeouts.request must be at least 1".to_string(),
            ));
        }
        if self.specialists.timeout_secs == 0 {
            return Err(SetupError::InvalidConfig(
                "specialists.timeout_secs must be at least 1".to_string(),
            ));
        }
        for kind in SpecialistKind::ALL {
            if self.specialists.url_for(kind).is_none() {
                tracing::warn!(
                    "Service URL for specialist '{}' is not configured (set specialists.{}_url or {})",
                    kind,
                    kind,
                    kind.legacy_env_var()
                );
            }
        }
        Ok(())
    }
}

/// 从 config 目录加载配置，环境变量 SWITCHBOARD__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 叠加环境变量 SWITCHBOARD__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SWITCHBOARD")
            .separator("__")
            .try_parsing(true),
    );

    let mut cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.apply_env_fallbacks(|key| std::env::var(key).ok());
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.recursion_limit, 25);
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.specialists.timeout_secs, 120);
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:8080");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_fallbacks_fill_only_missing_urls() {
        let mut cfg = AppConfig::default();
        cfg.specialists.planner_url = Some("http://planner.local".to_string());
        cfg.apply_env_fallbacks(lookup(&[
            ("PLANNER_AGENT_SERVICE_URL", "http://ignored"),
            ("SOCIAL_AGENT_SERVICE_URL", "http://social.local"),
            ("PORT", "9001"),
        ]));
        assert_eq!(
            cfg.specialists.url_for(SpecialistKind::Planner),
            Some("http://planner.local")
        );
        assert_eq!(
            cfg.specialists.url_for(SpecialistKind::Social),
            Some("http://social.local")
        );
        assert_eq!(cfg.specialists.url_for(SpecialistKind::Platform), None);
        assert_eq!(cfg.server.port, 9001);
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_fallbacks(lookup(&[("PORT", "not-a-port")]));
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn test_blank_url_counts_as_unconfigured() {
        let mut cfg = AppConfig::default();
        cfg.specialists.platform_url = Some("  ".to_string());
        assert_eq!(cfg.specialists.url_for(SpecialistKind::Platform), None);
    }

    #[test]
    fn test_zero_recursion_limit_rejected() {
        let mut cfg = AppConfig::default();
        cfg.app.recursion_limit = 0;
        assert!(matches!(cfg.validate(), Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut cfg = AppConfig::default();
        cfg.llm.timeouts.request = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("llm.timeouts.request"));

        let mut cfg = AppConfig::default();
        cfg.specialists.timeout_secs = 0;
        assert!(matches!(cfg.validate(), Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[app]
recursion_limit = 7

[llm]
provider = "mock"

[specialists]
planner_url = "http://127.0.0.1:8001"
timeout_secs = 5
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.app.recursion_limit, 7);
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.specialists.timeout_secs, 5);
        assert_eq!(
            cfg.specialists.url_for(SpecialistKind::Planner),
            Some("http://127.0.0.1:8001")
        );
    }
}
