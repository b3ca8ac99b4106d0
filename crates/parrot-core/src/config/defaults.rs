//! Default value functions for serde.

use std::collections::BTreeMap;

pub(super) fn default_name() -> String {
    "Parrot".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.parrot".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_db_path() -> String {
    "~/.parrot/qa.db".to_string()
}
pub(super) fn default_max_connections() -> u32 {
    4
}
pub(super) fn default_invite_timeout() -> u64 {
    10
}
pub(super) fn default_registration_timeout() -> u64 {
    60
}

pub(super) fn default_invite_triggers() -> Vec<String> {
    vec!["邀请码".to_string(), "invitation code".to_string()]
}

/// Head nouns that commonly anchor a question ("where is the map", "新手攻略").
pub(super) fn default_core_words() -> BTreeMap<String, Vec<String>> {
    let mut words = BTreeMap::new();
    words.insert(
        "en".to_string(),
        ["map", "guide", "tutorial", "help", "instructions"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    words.insert(
        "zh".to_string(),
        ["地图", "攻略", "指南", "教程", "帮助", "说明"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    words
}
