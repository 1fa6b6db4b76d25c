//! Integration tests for the HEMS scenery generator

mod batch_isolation;
mod pipeline_cache;
mod test_utils;
