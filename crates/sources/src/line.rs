//! Bounded line reading for stream listeners

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Result of reading one line
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadLine {
    /// One line without its `\n`; a trailing `\r` is kept
    Line(Bytes),
    /// Line exceeded the limit and was consumed and discarded
    TooLong,
    /// End of stream
    Eof,
}

/// Read one `\n`-terminated line of at most `max_len` bytes
///
/// Memory stays bounded: bytes past the limit are consumed without being
/// stored. Progress lives in `buf`, so a call dropped mid-line (for example
/// by `select!`) resumes where it stopped on the next call with the same
/// buffer.
///
/// A final line without `\n` is returned at end of stream.
pub(crate) async fn read_bounded_line<R>(
    reader: &mut R,
    buf: &mut BytesMut,
    max_len: usize,
) -> io::Result<ReadLine>
where
    R: AsyncBufReadExt + Unpin,
{
    // Room for the line plus its newline
    let limit = max_len.saturating_add(1);

    loop {
        let available = reader.fill_buf().await?;

        if available.is_empty() {
            if buf.is_empty() {
                return Ok(ReadLine::Eof);
            }
            if buf.len() > max_len {
                buf.clear();
                return Ok(ReadLine::TooLong);
            }
            return Ok(ReadLine::Line(buf.split().freeze()));
        }

        let (take, done) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };

        let room = limit.saturating_sub(buf.len());
        buf.extend_from_slice(&available[..take.min(room)]);
        reader.consume(take);

        if done {
            return Ok(finish_line(buf));
        }
    }
}

/// Next complete line already sitting in `reader`'s buffer
///
/// Never touches the underlying stream. Continues a partial line held in
/// `buf`; returns `None` once only a fragment without `\n` is left.
pub(crate) fn take_buffered_line<R>(
    reader: &mut BufReader<R>,
    buf: &mut BytesMut,
    max_len: usize,
) -> Option<ReadLine>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let available = reader.buffer();
    let take = available.iter().position(|&b| b == b'\n')? + 1;

    let room = max_len.saturating_add(1).saturating_sub(buf.len());
    buf.extend_from_slice(&available[..take.min(room)]);
    reader.consume(take);

    Some(finish_line(buf))
}

/// Split a `\n`-terminated line off `buf`
fn finish_line(buf: &mut BytesMut) -> ReadLine {
    // An overflowing line was cut before its newline
    if buf.last() != Some(&b'\n') {
        buf.clear();
        return ReadLine::TooLong;
    }
    let mut line = buf.split().freeze();
    line.truncate(line.len() - 1);
    ReadLine::Line(line)
}

/// Peer went away; expected and not worth counting as an error
pub(crate) fn is_connection_reset(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_all(input: &[u8], max_len: usize) -> Vec<ReadLine> {
        // Tiny buffer so lines span several fills
        let mut reader = BufReader::with_capacity(3, input);
        let mut buf = BytesMut::new();
        let mut out = Vec::new();
        loop {
            let result = read_bounded_line(&mut reader, &mut buf, max_len).await.unwrap();
            if result == ReadLine::Eof {
                return out;
            }
            out.push(result);
        }
    }

    fn line(s: &'static str) -> ReadLine {
        ReadLine::Line(Bytes::from_static(s.as_bytes()))
    }

    #[tokio::test]
    async fn test_splits_on_newline() {
        let lines = read_all(b"a.b 1 100\nc.d 2 200\n", 64).await;
        assert_eq!(lines, vec![line("a.b 1 100"), line("c.d 2 200")]);
    }

    #[tokio::test]
    async fn test_keeps_carriage_return() {
        let lines = read_all(b"a 1 1\r\n", 64).await;
        assert_eq!(lines, vec![line("a 1 1\r")]);
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let lines = read_all(b"a 1 1\nb 2 2", 64).await;
        assert_eq!(lines, vec![line("a 1 1"), line("b 2 2")]);
    }

    #[tokio::test]
    async fn test_empty_lines_returned_empty() {
        let lines = read_all(b"\n\na 1 1\n", 64).await;
        assert_eq!(lines, vec![line(""), line(""), line("a 1 1")]);
    }

    #[tokio::test]
    async fn test_too_long_line_skipped() {
        let lines = read_all(b"short\nthis-line-is-too-long\nok\n", 8).await;
        assert_eq!(lines, vec![line("short"), ReadLine::TooLong, line("ok")]);
    }

    #[tokio::test]
    async fn test_line_exactly_at_limit() {
        let lines = read_all(b"12345678\n123456789\n", 8).await;
        assert_eq!(lines, vec![line("12345678"), ReadLine::TooLong]);
    }

    #[tokio::test]
    async fn test_too_long_final_line() {
        let lines = read_all(b"ok\n0123456789abcdef", 8).await;
        assert_eq!(lines, vec![line("ok"), ReadLine::TooLong]);
    }

    #[tokio::test]
    async fn test_buffered_lines_taken_without_reading() {
        let input: &[u8] = b"a 1 1\nb 2 2\nc 3";
        let mut reader = BufReader::with_capacity(64, input);
        let mut buf = BytesMut::new();

        // Pull the first line through the socket path, buffering the rest
        let first = read_bounded_line(&mut reader, &mut buf, 64).await.unwrap();
        assert_eq!(first, line("a 1 1"));

        assert_eq!(take_buffered_line(&mut reader, &mut buf, 64), Some(line("b 2 2")));
        // The trailing fragment stays put
        assert_eq!(take_buffered_line(&mut reader, &mut buf, 64), None);
        assert_eq!(reader.buffer(), b"c 3");
    }

    #[tokio::test]
    async fn test_buffered_lines_stop_at_buffer_end() {
        let input: &[u8] = b"a 1 1\nb 2 2\nc 3 3\n";
        // Only "a 1 1\nb 2 " fits in the first fill
        let mut reader = BufReader::with_capacity(10, input);
        let mut buf = BytesMut::new();

        assert_eq!(read_bounded_line(&mut reader, &mut buf, 64).await.unwrap(), line("a 1 1"));
        assert_eq!(take_buffered_line(&mut reader, &mut buf, 64), None);
        assert_eq!(reader.buffer(), b"b 2 ");
    }

    #[tokio::test]
    async fn test_buffered_too_long_line() {
        let input: &[u8] = b"ok\n0123456789\nfine\n";
        let mut reader = BufReader::with_capacity(64, input);
        let mut buf = BytesMut::new();

        assert_eq!(read_bounded_line(&mut reader, &mut buf, 8).await.unwrap(), line("ok"));
        assert_eq!(take_buffered_line(&mut reader, &mut buf, 8), Some(ReadLine::TooLong));
        assert_eq!(take_buffered_line(&mut reader, &mut buf, 8), Some(line("fine")));
        assert_eq!(take_buffered_line(&mut reader, &mut buf, 8), None);
    }

    #[test]
    fn test_connection_reset_kinds() {
        assert!(is_connection_reset(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(is_connection_reset(&io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(!is_connection_reset(&io::Error::from(io::ErrorKind::InvalidData)));
    }
}
