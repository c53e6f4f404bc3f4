#![allow(dead_code)]
pub mod algebra;
pub mod interval_algebra;
pub mod sfa;
pub mod oracle;
pub mod learning;
pub mod reader;
mod stopwatch;
pub mod util;
use serde::de::DeserializeOwned;
use serde::Serialize;
pub trait Symbol:
    std::hash::Hash
    + std::cmp::Eq
    + std::fmt::Display
    + Sized
    + Copy
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + std::marker::Send
{
}
impl Symbol for char {}
impl Symbol for u8 {}
impl Symbol for u32 {}
impl Symbol for u64 {}
impl Symbol for i32 {}
impl Symbol for i64 {}
pub use crate::algebra::BooleanAlgebra;
pub use crate::stopwatch::Stopwatch;
