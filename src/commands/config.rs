//! `kb config show`.

use std::path::PathBuf;

use serde::Serialize;

use super::{Output, json_line};
use crate::config::{Resolved, ResolvedConfig};

/// The resolved configuration, token masked.
#[derive(Serialize)]
pub struct ConfigShow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub api_base: Resolved<String>,
    pub token: Option<Resolved<String>>,
    pub user_name: Option<Resolved<String>>,
    pub debounce_ms: Resolved<u64>,
    pub request_timeout_secs: Resolved<u64>,
}

impl Output for ConfigShow {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        fn row<T: std::fmt::Display>(key: &str, value: &Option<Resolved<T>>) -> String {
            match value {
                Some(r) => format!("{:<22}{} ({})", key, r.value, r.source),
                None => format!("{:<22}(not set)", key),
            }
        }

        let mut lines = Vec::new();
        if let Some(path) = &self.path {
            lines.push(format!("{:<22}{}", "config file", path.display()));
        }
        lines.push(row("api-base", &Some(self.api_base.clone())));
        lines.push(row("token", &self.token));
        lines.push(row("user-name", &self.user_name));
        lines.push(row("debounce-ms", &Some(self.debounce_ms.clone())));
        lines.push(row(
            "request-timeout-secs",
            &Some(self.request_timeout_secs.clone()),
        ));
        lines.join("\n")
    }
}

/// Show where every setting came from.
pub fn config_show(config: &ResolvedConfig) -> ConfigShow {
    ConfigShow {
        path: config.path.clone(),
        api_base: config.api_base.clone(),
        token: config
            .token
            .as_ref()
            .map(|t| Resolved::new(crate::config::mask_token(&t.value), t.source.clone())),
        user_name: config.user_name.clone(),
        debounce_ms: config.debounce_ms.clone(),
        request_timeout_secs: config.request_timeout_secs.clone(),
    }
}
