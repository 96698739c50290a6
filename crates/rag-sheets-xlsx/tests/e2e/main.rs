//! End-to-end tests for rag-sheets-xlsx.
//!
//! Each test builds the exact package it needs in memory with
//! [`common::XlsxFixture`], then reads it back with `XlsxReader` and asserts
//! on the resulting workbook model.

mod common;
mod reading;

pub use common::*;
