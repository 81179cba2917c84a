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

use crate::exception::ErrorCode;

macro_rules! build_exceptions {
    ($($(#[$meta:meta])* $body:ident($code:expr)),*$(,)*) => {
        impl ErrorCode {
            $(
                $(#[$meta])*
                pub fn $body(display_text: impl Into<String>) -> ErrorCode {
                    ErrorCode::create($code, display_text.into(), None)
                }
            )*

            pub fn name(&self) -> &'static str {
                match self.code() {
                    $($code => stringify!($body),)*
                    _ => "Unknown",
                }
            }
        }
    }
}

build_exceptions! {
    Ok(0),

    /// Any I/O failure: open, read, write, rename.
    Io(1001),
    /// Malformed CSV line or cell literal.
    Parse(1002),
    /// A value cannot be coerced to a declared tag.
    TypeMismatch(1003),
    /// Row arity or column names disagree.
    SchemaMismatch(1004),
    /// Column name already present.
    DuplicateName(1005),
    /// Columns of differing lengths in a single operation.
    LengthMismatch(1006),
    /// Caller-supplied parameter out of domain.
    InvalidArgument(1007),
    /// Operation attempted on a closed or unopened object.
    InvalidState(1008),
    /// `len` requested on a volatile unmaterialized operator.
    SizeUnknown(1009),
    /// Index past the end of a column or frame.
    OutOfRange(1010),
    /// Allocation failure reported by the OS.
    Memory(1011),
    /// Process-wide cancellation observed.
    Cancelled(1012),
    /// Named object absent: column name, directory, file.
    NotFound(1013),
    /// Directory archive metadata missing or mismatched.
    BadArchive(1014),
    /// A worker task died without reporting a result.
    Internal(1015),
}
