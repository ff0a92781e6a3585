pub mod parser;
pub mod resolver;

pub use resolver::PlaylistResolver;

/// One media chunk of a live playlist.
///
/// `ordinal` is the position in the playlist and is the only thing that
/// decides where the chunk lands in an assembled clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub ordinal: usize,
    pub source_url: String,
}
