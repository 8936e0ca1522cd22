/// MindMap Generation Engine - Text-Generation Backend Adapter
///
/// This crate adapts the external text-generation service behind a single
/// `TextGenerator` capability so the core content pipeline never needs to
/// know which model family is serving it.
///
/// # Features
///
/// - **Family Adapters**: Claude, Titan and Nova request/response shapes
///   behind one trait, selected by configuration at startup
/// - **Normalization**: all backends reduce to plain text, with markdown
///   code fences stripped from model output
/// - **Bounded Calls**: every invocation carries the configured timeout
///
/// # Example
///
/// ```ignore
/// use mindmap_gen_engine::{GenerationConfig, HttpTextGenerator, TextGenerator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = GenerationConfig::default();
///     let backend = HttpTextGenerator::new(config)?;
///
///     let text = backend
///         .generate("Explain mind maps in two sentences.", &Default::default())
///         .await?;
///
///     println!("{text}");
///     Ok(())
/// }
/// ```
pub mod backend;
pub mod config;
pub mod error;

// Re-export main types
pub use backend::{GenerationParams, HttpTextGenerator, TextGenerator};
pub use config::{GenerationConfig, ModelFamily};
pub use error::{GenerationError, Result};
