//! Wire protocol codec
//!
//! One exchange per connection: the client sends the requested file name as a
//! length-prefixed modified-UTF-8 string (2-byte big-endian length counting the
//! encoded bytes), the server answers with an 8-byte big-endian signed status
//! code, then — unless the code is the invalid-request sentinel — the raw file
//! bytes, terminated by the server closing its side of the connection.
//!
//! The string encoding is CESU-8 with a two-byte NUL: characters U+0001..U+007F
//! are one byte, U+0000 and U+0080..U+07FF two bytes, U+0800..U+FFFF three
//! bytes, and supplementary characters are emitted as a UTF-16 surrogate pair
//! with each surrogate in three-byte form. Any compatible peer must match this
//! exact on-wire form.

use crate::error::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Status code the server sends when it rejects the requested file name
pub const INVALID_REQUEST: i64 = -1;

/// Fixed chunk size for reading the response body
pub const READ_CHUNK_SIZE: usize = 1024;

/// Encode a file name into modified UTF-8 (no length prefix).
fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let cp = c as u32;
        match cp {
            0x0001..=0x007F => out.push(cp as u8),
            // U+0000 uses the two-byte form so no raw NUL appears on the wire
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((cp >> 6) & 0x1F) as u8);
                out.push(0x80 | (cp & 0x3F) as u8);
            }
            0x0800..=0xFFFF => {
                out.push(0xE0 | ((cp >> 12) & 0x0F) as u8);
                out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
                out.push(0x80 | (cp & 0x3F) as u8);
            }
            _ => {
                let v = cp - 0x1_0000;
                let high = 0xD800 + (v >> 10);
                let low = 0xDC00 + (v & 0x3FF);
                for surrogate in [high, low] {
                    out.push(0xE0 | ((surrogate >> 12) & 0x0F) as u8);
                    out.push(0x80 | ((surrogate >> 6) & 0x3F) as u8);
                    out.push(0x80 | (surrogate & 0x3F) as u8);
                }
            }
        }
    }
    out
}

/// Decode modified UTF-8 back into a string.
///
/// Surrogate halves from the three-byte form are recombined; malformed byte
/// sequences and unpaired surrogates are protocol errors.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(u16::from(b));
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let [_, b1] = two(bytes, i)?;
            units.push((u16::from(b & 0x1F) << 6) | u16::from(b1 & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let [b1, b2] = continuation_pair(bytes, i)?;
            units.push(
                (u16::from(b & 0x0F) << 12) | (u16::from(b1 & 0x3F) << 6) | u16::from(b2 & 0x3F),
            );
            i += 3;
        } else {
            return Err(Error::Protocol(format!(
                "malformed modified UTF-8 at byte {i}: 0x{b:02X}"
            )));
        }
    }
    String::from_utf16(&units)
        .map_err(|_| Error::Protocol("unpaired surrogate in file name".to_string()))
}

fn two(bytes: &[u8], i: usize) -> Result<[u8; 2]> {
    let b1 = *bytes
        .get(i + 1)
        .ok_or_else(|| Error::Protocol("truncated modified UTF-8 sequence".to_string()))?;
    if b1 & 0xC0 != 0x80 {
        return Err(Error::Protocol(format!(
            "invalid continuation byte 0x{b1:02X}"
        )));
    }
    Ok([bytes[i], b1])
}

fn continuation_pair(bytes: &[u8], i: usize) -> Result<[u8; 2]> {
    let [_, b1] = two(bytes, i)?;
    let [_, b2] = two(bytes, i + 1)?;
    Ok([b1, b2])
}

/// Encode a complete request frame: 2-byte big-endian length plus encoded name.
///
/// Fails with a protocol error when the encoded name exceeds the 16-bit length
/// field.
pub fn encode_request(file_name: &str) -> Result<Vec<u8>> {
    let encoded = encode_modified_utf8(file_name);
    if encoded.len() > usize::from(u16::MAX) {
        return Err(Error::Protocol(format!(
            "file name too long: {} encoded bytes (max {})",
            encoded.len(),
            u16::MAX
        )));
    }
    let mut frame = Vec::with_capacity(2 + encoded.len());
    frame.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
    frame.extend_from_slice(&encoded);
    Ok(frame)
}

/// Decode the payload of a request frame (the bytes after the length prefix).
pub fn decode_request(payload: &[u8]) -> Result<String> {
    decode_modified_utf8(payload)
}

/// Write one request frame and flush it.
pub async fn write_request<W: AsyncWrite + Unpin>(writer: &mut W, file_name: &str) -> Result<()> {
    let frame = encode_request(file_name)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one request frame. Server-side counterpart used by test harnesses.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16().await?;
    let mut payload = vec![0u8; usize::from(len)];
    reader.read_exact(&mut payload).await?;
    decode_modified_utf8(&payload)
}

/// Read the 8-byte big-endian signed status code.
pub async fn read_status<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i64> {
    Ok(reader.read_i64().await?)
}

/// Write an 8-byte big-endian signed status code.
pub async fn write_status<W: AsyncWrite + Unpin>(writer: &mut W, code: i64) -> Result<()> {
    writer.write_i64(code).await?;
    writer.flush().await?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn ascii_request_frame_matches_reference_encoding() {
        let frame = encode_request("a.txt").unwrap();
        assert_eq!(frame, vec![0x00, 0x05, b'a', b'.', b't', b'x', b't']);
    }

    #[test]
    fn nul_encodes_as_two_bytes() {
        let frame = encode_request("\u{0}").unwrap();
        assert_eq!(frame, vec![0x00, 0x02, 0xC0, 0x80]);
    }

    #[test]
    fn two_and_three_byte_forms() {
        // U+00E9 (é) -> C3 A9, U+20AC (€) -> E2 82 AC
        let frame = encode_request("é€").unwrap();
        assert_eq!(frame, vec![0x00, 0x05, 0xC3, 0xA9, 0xE2, 0x82, 0xAC]);
    }

    #[test]
    fn supplementary_character_uses_surrogate_form() {
        // U+1F600 -> surrogates D83D DE00, each in three-byte form (CESU-8),
        // not the four-byte UTF-8 form
        let frame = encode_request("\u{1F600}").unwrap();
        assert_eq!(
            frame,
            vec![0x00, 0x06, 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]
        );
    }

    #[test]
    fn decode_round_trips_encode() {
        for name in ["a.txt", "héllo.bin", "\u{0}", "emoji-\u{1F600}.dat", "数据.txt"] {
            let frame = encode_request(name).unwrap();
            let decoded = decode_request(&frame[2..]).unwrap();
            assert_eq!(decoded, name, "round trip failed for {name:?}");
        }
    }

    #[test]
    fn oversized_name_is_rejected() {
        let name = "x".repeat(usize::from(u16::MAX) + 1);
        let err = encode_request(&name).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn truncated_sequence_is_a_protocol_error() {
        // Lone lead byte of a two-byte form
        let err = decode_request(&[0xC3]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn unpaired_surrogate_is_a_protocol_error() {
        // High surrogate D83D with no low surrogate following
        let err = decode_request(&[0xED, 0xA0, 0xBD]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn framed_request_round_trips_over_a_stream() {
        let mut buf: Vec<u8> = Vec::new();
        write_request(&mut buf, "some file.bin").await.unwrap();

        let mut reader = std::io::Cursor::new(buf);
        let name = tokio_test::assert_ok!(read_request(&mut reader).await);
        assert_eq!(name, "some file.bin");
    }

    #[tokio::test]
    async fn status_code_round_trips_big_endian() {
        let mut buf: Vec<u8> = Vec::new();
        write_status(&mut buf, INVALID_REQUEST).await.unwrap();
        assert_eq!(buf, (-1i64).to_be_bytes());

        let mut reader = std::io::Cursor::new(buf);
        assert_eq!(read_status(&mut reader).await.unwrap(), INVALID_REQUEST);
    }

    #[tokio::test]
    async fn short_status_read_is_an_io_error() {
        let mut reader = std::io::Cursor::new(vec![0u8; 4]);
        let err = read_status(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
