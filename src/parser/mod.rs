// Copyright 2022 Ryan Seipp
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

//! The two-level HTTP/1.1 request parser: [`line`] extracts CRLF-terminated
//! lines incrementally from a fixed buffer, [`request`] drives the
//! request-line/header/content state machine over those lines.

pub mod line;
pub mod request;

/// Outcome of driving the request parser as far as the currently-buffered
/// bytes allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Insufficient data; the caller must await more input.
    NoRequest,
    /// A complete, well-formed request; dispatch to the resolver.
    GetRequest,
    /// Malformed syntax.
    BadRequest,
    /// The resolver found no artifact at the requested path.
    NoResource,
    /// The artifact is not world-readable, or is a directory.
    ForbiddenRequest,
    /// The artifact was resolved and memory-mapped.
    FileRequest,
    /// The parser reached a state it should not be able to reach.
    InternalError,
}
