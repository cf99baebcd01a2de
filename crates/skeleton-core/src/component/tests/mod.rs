pub mod base_tests;
pub mod registrar_tests;
