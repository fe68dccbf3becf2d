//! Matchmaking player and its typed attribute values

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A player attribute value; exactly one of the four shapes is carried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "AttrType")]
pub enum AttributeValue {
    #[serde(rename = "STRING")]
    String {
        #[serde(rename = "S")]
        s: String,
    },
    #[serde(rename = "DOUBLE")]
    Double {
        #[serde(rename = "N")]
        n: f64,
    },
    #[serde(rename = "STRING_LIST")]
    StringList {
        #[serde(rename = "SL")]
        sl: Vec<String>,
    },
    #[serde(rename = "STRING_DOUBLE_MAP")]
    StringDoubleMap {
        #[serde(rename = "SDM")]
        sdm: HashMap<String, f64>,
    },
}

impl AttributeValue {
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String { s: value.into() }
    }

    #[must_use]
    pub fn double(value: f64) -> Self {
        Self::Double { n: value }
    }

    #[must_use]
    pub fn string_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StringList {
            sl: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn string_double_map<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::StringDoubleMap {
            sdm: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Wire name of the attribute type
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "STRING",
            Self::Double { .. } => "DOUBLE",
            Self::StringList { .. } => "STRING_LIST",
            Self::StringDoubleMap { .. } => "STRING_DOUBLE_MAP",
        }
    }
}

/// A player taking part in matchmaking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Player {
    pub player_id: String,
    #[serde(default)]
    pub player_attributes: HashMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Latency per region, in milliseconds
    #[serde(default)]
    pub latency_in_ms: HashMap<String, i32>,
}

impl Player {
    #[must_use]
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.player_attributes.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    #[must_use]
    pub fn with_latency(mut self, region: impl Into<String>, latency_ms: i32) -> Self {
        self.latency_in_ms.insert(region.into(), latency_ms);
        self
    }
}
