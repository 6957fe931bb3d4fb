//! Reading and writing the binary feature packet stream.

pub mod codec;
mod error;
pub mod reader;
pub mod seekable;
pub mod writer;

pub use codec::{ByteOrder, CountingReader, PacketCodec, WirePacket};
pub use error::{Result, StreamError};
pub use reader::{StreamContents, StreamReader};
pub use seekable::{FrameSource, SeekableReader};
pub use writer::StreamWriter;
