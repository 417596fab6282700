use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::decode::{self, Decoded};
use crate::value::Value;

/// One client connection. Bytes are read in chunks into the buffer and each
/// chunk is decoded as a standalone pipeline of commands.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection {
            stream,
            // Allocate the buffer with 4kb of capacity.
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Reads the next chunk of client bytes and decodes it. Returns `None`
    /// once the peer closes its end of the stream.
    pub async fn read_requests(&mut self) -> std::io::Result<Option<Decoded>> {
        self.buffer.clear();
        let read = self.stream.read_buf(&mut self.buffer).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(decode::parse_request(&self.buffer)))
    }

    /// Writes one reply line: the value's textual rendering plus `\n`.
    pub async fn write_reply(&mut self, reply: &Value) -> std::io::Result<()> {
        let mut line = reply.render().into_bytes();
        line.push(b'\n');
        self.stream.write_all(&line).await
    }
}
