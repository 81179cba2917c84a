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

use crate::exception::ErrorCode;

impl From<std::io::Error> for ErrorCode {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::NotFound(error.to_string()),
            std::io::ErrorKind::OutOfMemory => ErrorCode::Memory(error.to_string()),
            _ => ErrorCode::Io(error.to_string()),
        }
    }
}

impl From<std::string::FromUtf8Error> for ErrorCode {
    fn from(error: std::string::FromUtf8Error) -> Self {
        ErrorCode::Parse(format!("Invalid UTF-8: {}", error))
    }
}

impl From<std::str::Utf8Error> for ErrorCode {
    fn from(error: std::str::Utf8Error) -> Self {
        ErrorCode::Parse(format!("Invalid UTF-8: {}", error))
    }
}

impl From<std::num::ParseIntError> for ErrorCode {
    fn from(error: std::num::ParseIntError) -> Self {
        ErrorCode::Parse(error.to_string())
    }
}

impl From<std::num::ParseFloatError> for ErrorCode {
    fn from(error: std::num::ParseFloatError) -> Self {
        ErrorCode::Parse(error.to_string())
    }
}

impl From<serde_json::Error> for ErrorCode {
    fn from(error: serde_json::Error) -> Self {
        ErrorCode::BadArchive(format!("Malformed index metadata: {}", error))
    }
}
