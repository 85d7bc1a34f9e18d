//! Image text recognition.
//!
//! Two engines sit behind small traits so the image fallback policy can be
//! exercised without Tesseract or network access:
//! - [`LocalOcr`], implemented by [`TesseractOcr`] (leptess, run on the
//!   blocking pool after [`preprocess_image`])
//! - [`VisionOcr`], implemented by [`OpenAiVisionClient`] (OpenAI-compatible
//!   chat completion with the image inlined as a base64 data URL)

mod api;
mod preprocessing;
mod provider;

pub use api::{OpenAiVisionClient, VisionOcr};
pub use preprocessing::preprocess_image;
pub use provider::{LocalOcr, TesseractOcr};
