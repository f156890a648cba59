mod api_tests;
mod support;
