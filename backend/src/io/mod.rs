//! # IO Module
//!
//! Interface layer exposing the domain services to clients. The only
//! transport is the JSON REST API in [`rest`].

pub mod rest;
