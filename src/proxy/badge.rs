//! Badge query construction.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::config::BadgeConfig;

/// Query parameters understood by the static badge renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeQuery {
    pub label: String,
    pub message: String,
    pub color: String,
}

impl BadgeQuery {
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("label", &self.label)
            .append_pair("message", &self.message)
            .append_pair("color", &self.color)
            .finish()
    }
}

/// Maps a service and view count onto a badge.
#[derive(Debug, Clone)]
pub struct BadgeStyle {
    services: BTreeMap<String, String>,
    label_suffix: String,
    color: String,
}

impl BadgeStyle {
    pub fn from_config(config: &BadgeConfig) -> Self {
        Self {
            services: config.services.clone(),
            label_suffix: config.badge.label_suffix.clone(),
            color: config.badge.color.clone(),
        }
    }

    pub fn is_known(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    /// Display name for `service`, or the identifier itself when unmapped.
    pub fn display_name<'a>(&'a self, service: &'a str) -> &'a str {
        self.services
            .get(service)
            .map(String::as_str)
            .unwrap_or(service)
    }

    pub fn query(&self, service: &str, count: i64) -> BadgeQuery {
        let name = self.display_name(service);
        let label = if self.label_suffix.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", name, self.label_suffix)
        };

        BadgeQuery {
            label,
            message: count.to_string(),
            color: self.color.clone(),
        }
    }
}
