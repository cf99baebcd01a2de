pub mod id_tests;
