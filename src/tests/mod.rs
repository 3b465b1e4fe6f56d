// Test modules for POS Admin
// Each module covers one area of the library; shared fakes live in helpers

mod helpers;

mod cart_tests;
mod receipt_tests;
