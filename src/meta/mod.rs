pub mod processors;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::MessageError;
use crate::traits::MessageMeta;

pub use processors::Processor;

// --- メッセージバスの正規化済みメッセージ ---
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FedMessage {
    pub topic: String,
    #[serde(default)]
    pub msg: Value,
    #[serde(default)]
    pub msg_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    /// 事前計算済みのメタデータ（datagrepper 形式）
    #[serde(default)]
    pub meta: Option<PrecomputedMeta>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrecomputedMeta {
    #[serde(default)]
    pub usernames: Option<Vec<String>>,
    #[serde(default)]
    pub packages: Option<Vec<String>>,
}

impl FedMessage {
    pub fn new(topic: impl Into<String>, msg: Value) -> Self {
        Self {
            topic: topic.into(),
            msg,
            msg_id: None,
            timestamp: None,
            meta: None,
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MessageError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn processor(&self) -> Processor {
        Processor::for_topic(&self.topic)
    }
}

impl MessageMeta for FedMessage {
    fn usernames(&self) -> HashSet<String> {
        // 事前計算済みの値があればそれを優先する
        if let Some(usernames) = self.meta.as_ref().and_then(|m| m.usernames.as_ref()) {
            return usernames.iter().cloned().collect();
        }
        self.processor().usernames(&self.msg)
    }

    fn packages(&self) -> HashSet<String> {
        if let Some(packages) = self.meta.as_ref().and_then(|m| m.packages.as_ref()) {
            return packages.iter().cloned().collect();
        }
        self.processor().packages(&self.msg)
    }
}
