//! Integration tests for the harvester
//!
//! These tests run the real HTTP fetcher and DAAD extractor against wiremock
//! servers and check the files the pipeline leaves behind.

mod discovery_tests;
mod pipeline_tests;
mod support;
