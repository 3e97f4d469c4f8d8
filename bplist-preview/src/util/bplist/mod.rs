/*!
 Contains logic and data structures used to decode binary property list data into native Rust
 data structures.

 ## Overview

 The binary property list format (`bplist00`) is Apple's compact serialization of property list
 data, used across Foundation for archives, preferences, and attachment payloads.

 ## Features

 - Pure Rust implementation with no dependencies on Apple frameworks
 - Every offset, length, and reference is bounds checked before it is read
 - Shared and circular references are resolved without unbounded recursion
*/

pub mod models;
pub mod parser;
#[cfg(test)]
pub(crate) mod tests;
