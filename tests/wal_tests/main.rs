mod reader_tests;
mod recovery_tests;
mod writer_tests;
