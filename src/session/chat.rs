// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Chat transcript records

use chrono::Local;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    /// Plain text for user messages, rendered HTML for bot messages
    pub content: String,
    /// Local wall-clock time, `HH:MM`
    pub time: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            time: now_hhmm(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            time: now_hhmm(),
        }
    }
}

fn now_hhmm() -> String {
    Local::now().format("%H:%M").to_string()
}
