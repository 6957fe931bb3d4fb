use std::io::Read;
use std::sync::Arc;

use super::{Result, StreamReader};
use crate::types::{Frame, GroupHeader, Profile};

/// A forward-only supply of frames.
pub trait FrameSource {
    /// Produce the next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<R: Read> FrameSource for StreamReader<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        StreamReader::next_frame(self)
    }
}

/// Adds bounded backward and forward navigation to a [`FrameSource`].
///
/// Every frame pulled from the source is kept in an append-only history, so
/// each one is decoded at most once no matter how often it is revisited.
#[derive(Debug)]
pub struct SeekableReader<S> {
    source: S,
    history: Vec<Frame>,
    cursor: usize,
    exhausted: bool,
}

impl<S: FrameSource> SeekableReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            history: Vec::new(),
            cursor: 0,
            exhausted: false,
        }
    }

    /// Index of the current frame in the history.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Frames materialized so far.
    pub fn history(&self) -> &[Frame] {
        &self.history
    }

    /// The frame under the cursor, pulling from the source as needed.
    pub fn current(&mut self) -> Result<Option<&Frame>> {
        self.materialize(self.cursor)?;
        if self.cursor >= self.history.len() {
            // Source ended short of the cursor; settle on the last frame.
            self.cursor = self.history.len().saturating_sub(1);
        }
        Ok(self.history.get(self.cursor))
    }

    /// Move the cursor by `delta` frames and return the frame there.
    ///
    /// The cursor stops at the first frame when moving back and at the last
    /// frame the source can produce when moving forward.
    pub fn step(&mut self, delta: isize) -> Result<Option<&Frame>> {
        self.cursor = self.cursor.saturating_add_signed(delta);
        self.current()
    }

    /// Advance by a single frame.
    pub fn advance(&mut self) -> Result<Option<&Frame>> {
        self.step(1)
    }

    pub fn current_group(&mut self) -> Result<Option<Arc<GroupHeader>>> {
        Ok(self.current()?.map(|frame| Arc::clone(&frame.group)))
    }

    pub fn current_profile(&mut self) -> Result<Option<Arc<Profile>>> {
        Ok(self.current()?.map(|frame| Arc::clone(frame.profile())))
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn materialize(&mut self, index: usize) -> Result<()> {
        while !self.exhausted && self.history.len() <= index {
            match self.source.next_frame()? {
                Some(frame) => self.history.push(frame),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }
}
