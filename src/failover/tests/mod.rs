// src/failover/tests/mod.rs
//! Tests for the failover interceptor
