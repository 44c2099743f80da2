use tracing::{info, instrument, warn};

use crate::height_pipeline::{
    common::error::Result,
    debug::{DebugSink, TiffDebugSink},
    frame::{FrameDecoder, FrameSource},
    options::ProcessorOptions,
    processing::{
        frame_processor::{FrameReport, HeightProcessor},
        timing::{PipelineTimings, Timer},
    },
};

/// Result for one frame of a stream. A failed frame does not stop the stream
#[derive(Debug)]
pub struct FrameOutcome {
    pub index: usize,
    pub result: Result<FrameReport>,
}

/// Reads frames from a source, decodes them and computes their height maps.
///
/// With debug output enabled every frame writes to the same debug image path,
/// so the file holds the last processed frame.
pub struct VideoHeightPipeline<S: FrameSource, D: FrameDecoder, K: DebugSink = TiffDebugSink> {
    source: S,
    decoder: D,
    processor: HeightProcessor<K>,
    timings: PipelineTimings,
    frames_read: usize,
}

impl<S: FrameSource, D: FrameDecoder> VideoHeightPipeline<S, D, TiffDebugSink> {
    pub fn new(source: S, decoder: D, options: ProcessorOptions) -> Result<Self> {
        Ok(Self::with_processor(source, decoder, HeightProcessor::new(options)?))
    }
}

impl<S: FrameSource, D: FrameDecoder, K: DebugSink> VideoHeightPipeline<S, D, K> {
    pub fn with_processor(source: S, decoder: D, processor: HeightProcessor<K>) -> Self {
        Self {
            source,
            decoder,
            processor,
            timings: PipelineTimings::new(),
            frames_read: 0,
        }
    }

    /// Processes the next frame. `Ok(None)` once the source is exhausted; an
    /// `Err` means the source itself failed.
    pub fn next_frame(&mut self) -> Result<Option<FrameOutcome>> {
        let timer = Timer::start("read_frame");
        let bytes = self.source.next_frame();
        self.timings.record(timer);

        let Some(bytes) = bytes? else {
            return Ok(None);
        };
        let index = self.frames_read;
        self.frames_read += 1;

        let timer = Timer::start("decode");
        let grid = self.decoder.decode(&bytes);
        self.timings.record(timer);

        let result = match grid {
            Ok(grid) => {
                let timer = Timer::start("compute");
                let report = self.processor.process(&grid);
                self.timings.record(timer);
                report
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(frame = index, "Frame failed: {}", e);
        }

        Ok(Some(FrameOutcome { index, result }))
    }

    /// Processes frames until the source is exhausted.
    #[instrument(skip(self))]
    pub fn run(&mut self) -> Result<Vec<FrameOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_frame()? {
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(frames = outcomes.len(), failed, "Stream finished");
        Ok(outcomes)
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    pub fn processor(&self) -> &HeightProcessor<K> {
        &self.processor
    }
}
