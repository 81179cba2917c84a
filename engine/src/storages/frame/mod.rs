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

#[allow(clippy::module_inception)]
mod frame;
mod index;
mod writer;

pub use frame::Frame;
pub use index::FrameColumnMeta;
pub use index::FrameIndex;
pub use index::FRAME_INDEX_EXT;
pub use writer::FrameSegmentWriter;
pub use writer::FrameWriter;
