//! RPC-style commands
//!
//! Requests arrive as `{"method": "...", "params": {...}}` and are parsed into
//! a typed command per target before anything is executed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw command as sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCall {
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RpcCall {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// `params.index`, defaulting to 0
    fn index(&self) -> Result<usize> {
        match self.params.get("index") {
            None | Some(Value::Null) => Ok(0),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    Error::IllegalArgument(format!("index must be a non-negative integer, got {}", value))
                }),
        }
    }

    fn unknown(&self) -> Error {
        Error::IllegalArgument(format!(
            "Cannot interpret {}",
            serde_json::to_string(self).unwrap_or_else(|_| self.method.clone())
        ))
    }
}

/// Description of one invocable method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDesc {
    pub name: String,
    pub uri: String,
    pub verb: String,
    pub example: RpcCall,
}

impl MethodDesc {
    fn post(uri: &str, example: RpcCall) -> Self {
        Self {
            name: example.method.clone(),
            uri: uri.to_string(),
            verb: "POST".to_string(),
            example,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Select(usize),
    Play,
    Pause,
}

impl PlayerCommand {
    pub fn parse(call: &RpcCall) -> Result<Self> {
        match call.method.as_str() {
            "select" => Ok(Self::Select(call.index()?)),
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            _ => Err(call.unknown()),
        }
    }

    pub fn describe(uri: &str) -> Vec<MethodDesc> {
        vec![
            MethodDesc::post(uri, RpcCall::new("select").with_param("index", 1)),
            MethodDesc::post(uri, RpcCall::new("play")),
            MethodDesc::post(uri, RpcCall::new("pause")),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerCommand {
    Select(usize),
}

impl TunerCommand {
    pub fn parse(call: &RpcCall) -> Result<Self> {
        match call.method.as_str() {
            "select" => Ok(Self::Select(call.index()?)),
            _ => Err(call.unknown()),
        }
    }

    pub fn describe(uri: &str) -> Vec<MethodDesc> {
        vec![MethodDesc::post(
            uri,
            RpcCall::new("select").with_param("index", 1),
        )]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCommand {
    Start,
    Stop,
    FadeIn,
    FadeOut,
}

impl AudioCommand {
    pub fn parse(call: &RpcCall) -> Result<Self> {
        match call.method.as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "fadeIn" => Ok(Self::FadeIn),
            "fadeOut" => Ok(Self::FadeOut),
            _ => Err(call.unknown()),
        }
    }

    pub fn describe(uri: &str) -> Vec<MethodDesc> {
        ["start", "stop", "fadeIn", "fadeOut"]
            .into_iter()
            .map(|method| MethodDesc::post(uri, RpcCall::new(method)))
            .collect()
    }
}
