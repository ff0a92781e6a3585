pub mod clip;
pub mod output;
pub mod preview;
pub mod tool;

pub use clip::ClipAssembler;
pub use output::{OutputIds, OutputJob};
pub use preview::PreviewExtractor;
pub use tool::{FfmpegTool, MediaTool};
