mod clients_tests;
mod common;
mod generation_tests;
mod properties_tests;
