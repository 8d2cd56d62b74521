//! Text generation.
//!
//! * [`GenerationClient`]: async trait implemented by every backend.
//! * [`GeminiClient`]: Gemini REST backend.
//! * [`GenerationResult`]: the reply text.
//! * [`GenerationError`]: error variants for generation calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use lorify::config::AppConfig;
//! use lorify::generation::{GeminiClient, GenerationClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let client = GeminiClient::from_config(&config.generation);
//!
//!     let result = client
//!         .generate("Introduce yourself super quickly!", config.generation.model.model_id())
//!         .await
//!         .unwrap();
//!     println!("{}", result.text);
//! }
//! ```

pub mod client;

pub use client::{GeminiClient, GenerationClient, GenerationError, GenerationResult};
