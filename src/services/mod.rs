pub mod quote_service;
pub mod requests;
