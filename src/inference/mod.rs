pub mod backend;
pub mod context;
pub mod openai;
pub mod service;
