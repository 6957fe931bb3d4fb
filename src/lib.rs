//! Reader, writer and feature transforms for binary speech feature streams.
//!
//! A stream is a flat sequence of packets: a [`Profile`](types::Profile)
//! describing the analysis front end, [`GroupHeader`](types::GroupHeader)s
//! opening labelled segments, and [`Frame`](types::Frame)s of band powers.
//! Frames carry no length field, so the [`stream`] reader keeps the active
//! profile and group as context while decoding. The [`transform`] module
//! turns decoded frames into fixed-length feature vectors.

pub mod cli;
pub mod config;
pub mod stream;
pub mod tools;
pub mod transform;
pub mod types;

pub use stream::{
    PacketCodec, SeekableReader, StreamContents, StreamError, StreamReader, StreamWriter,
};
pub use transform::{BasisCache, FeatureError, FeatureExtractor, FeatureMode};
pub use types::{Frame, FrameLayout, GroupHeader, Packet, PacketKind, Profile};
