use crate::height_pipeline::common::error::Result;

/// Sequential supplier of encoded frames.
///
/// `Ok(None)` signals the end of the stream and is distinct from a failure.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;
}
