pub mod auth;
pub mod config;
pub mod form_controller;
pub mod http_gateway;
pub mod navigator;
pub mod product_form;
pub mod session;
