// Copyright 2022 Strata Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(non_snake_case)]

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

pub type Result<T> = std::result::Result<T, ErrorCode>;

pub struct ErrorCode {
    code: u16,
    display_text: String,
    cause: Option<Box<dyn std::error::Error + Sync + Send>>,
}

impl ErrorCode {
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> String {
        self.cause
            .as_ref()
            .map(|cause| format!("{}\n{:?}", self.display_text, cause))
            .unwrap_or_else(|| self.display_text.clone())
    }

    pub fn add_message(self, msg: impl AsRef<str>) -> Self {
        Self {
            code: self.code,
            display_text: format!("{}\n{}", msg.as_ref(), self.display_text),
            cause: self.cause,
        }
    }

    pub fn add_message_back(self, msg: impl AsRef<str>) -> Self {
        Self {
            code: self.code,
            display_text: format!("{}{}", self.display_text, msg.as_ref()),
            cause: self.cause,
        }
    }

    pub fn create(
        code: u16,
        display_text: String,
        cause: Option<Box<dyn std::error::Error + Sync + Send>>,
    ) -> ErrorCode {
        ErrorCode {
            code,
            display_text,
            cause,
        }
    }

    /// The error serialized for the process boundary: `(kind, name, message)`
    /// plus an optional opaque body the peer may attach.
    pub fn to_wire(&self) -> WireError {
        WireError {
            code: self.code,
            name: self.name().to_string(),
            message: self.message(),
            body: None,
        }
    }
}

/// Error representation crossing the component boundary to foreign callers.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WireError {
    pub code: u16,
    pub name: String,
    pub message: String,
    pub body: Option<Vec<u8>>,
}

impl From<WireError> for ErrorCode {
    fn from(e: WireError) -> Self {
        ErrorCode::create(e.code, e.message, None)
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Code: {}, displayText = {}.",
            self.code,
            self.message()
        )
    }
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Code: {}, displayText = {}.",
            self.code,
            self.message()
        )
    }
}

impl Clone for ErrorCode {
    fn clone(&self) -> Self {
        ErrorCode::create(self.code, self.message(), None)
    }
}

impl std::error::Error for ErrorCode {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}
