//! Integration tests for Layer 1: Types
//!
//! Tests for the type registry, literal parsing and converter chains.

mod conversions;
mod literals;
