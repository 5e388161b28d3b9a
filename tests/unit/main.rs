//! Unit test modules.

mod export_test;
mod tss_test;
mod workout_parser_test;
