use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

use crate::stream::{FrameSource, SeekableReader};
use crate::types::Frame;

fn describe(index: usize, frame: &Frame, marker: char) -> String {
    let bands: Vec<String> = frame
        .band_powers
        .iter()
        .map(|power| format!("{:.1}", power))
        .collect();
    format!(
        "{} #{:<6} {:<12} {:<24} @{:<10} [{}]",
        marker,
        index,
        frame.label(),
        frame.group.source,
        frame.sample_offset,
        bands.join(" ")
    )
}

/// Print the frames within `context` of frame `index`, marking the target.
///
/// Returns the index actually reached, which is lower than requested when the
/// stream holds fewer frames.
pub fn show_neighbourhood<S: FrameSource, W: Write>(
    frames: &mut SeekableReader<S>,
    index: usize,
    context: usize,
    out: &mut W,
) -> Result<Option<usize>> {
    let target = isize::try_from(index).context("frame index too large")?;
    let reach = isize::try_from(context).context("context too large")?;

    if frames.step(target)?.is_none() {
        writeln!(out, "stream holds no frames")?;
        return Ok(None);
    }
    let reached = frames.position();
    debug!(requested = index, reached, "positioned on frame");

    frames.step(-reach)?;
    loop {
        let position = frames.position();
        if let Some(frame) = frames.current()? {
            let marker = if position == reached { '>' } else { ' ' };
            writeln!(out, "{}", describe(position, frame, marker))?;
        }
        if position >= reached + context || frames.advance()?.is_none() {
            break;
        }
        if frames.position() == position {
            // Source exhausted.
            break;
        }
    }
    out.flush()?;
    Ok(Some(reached))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::stream::StreamReader;
    use crate::tools::fixtures;

    fn frames(count: usize) -> SeekableReader<StreamReader<Cursor<Vec<u8>>>> {
        let bands: Vec<[f32; 3]> = (0..count).map(|i| [i as f32; 3]).collect();
        let bytes = fixtures::stream(&[("a.wav", "a", bands)]);
        SeekableReader::new(StreamReader::new(Cursor::new(bytes), fixtures::codec()))
    }

    #[test]
    fn prints_window_around_target() {
        let mut seek = frames(10);
        let mut out = Vec::new();
        let reached = show_neighbourhood(&mut seek, 5, 2, &mut out).unwrap();
        assert_eq!(reached, Some(5));

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("  #3"));
        assert!(lines[2].starts_with("> #5"));
        assert!(lines[4].starts_with("  #7"));
        // Frames 0..=7 were decoded once each.
        assert_eq!(seek.history().len(), 8);
    }

    #[test]
    fn clamps_at_both_ends() {
        let mut seek = frames(4);
        let mut out = Vec::new();
        let reached = show_neighbourhood(&mut seek, 9, 5, &mut out).unwrap();
        assert_eq!(reached, Some(3));

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().last().unwrap().starts_with("> #3"));
    }

    #[test]
    fn empty_stream_reports_no_frames() {
        let mut seek = frames(0);
        let mut out = Vec::new();
        assert_eq!(show_neighbourhood(&mut seek, 0, 1, &mut out).unwrap(), None);
    }
}
