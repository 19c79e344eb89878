//! Local HTTP gateway for PhilogicAI: authenticates chat requests, builds a
//! prompt from caller-supplied history, runs llama.cpp as a subprocess and
//! returns the extracted completion as JSON.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod llm;
