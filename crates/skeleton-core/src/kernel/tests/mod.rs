mod support;

pub mod context_tests;
