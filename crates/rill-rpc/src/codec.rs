// Rill - a small expression language
//
// Copyright (c) 2026 Rill contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Content-Length framing.
//!
//! Each frame is a block of `Name: Value` header lines terminated by an
//! empty line, followed by exactly `Content-Length` bytes of body. Header
//! names are case-insensitive; unknown headers are ignored.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

const CONTENT_LENGTH: &str = "content-length";

/// Read one frame body. Returns `None` on a clean end of stream (EOF at a
/// frame boundary). EOF inside a frame and malformed headers are errors.
pub async fn read_frame<R>(reader: &mut BufReader<R>) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut first_line = true;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if first_line {
                return Ok(None);
            }
            return Err(Error::InvalidHeader(
                "unexpected end of stream inside frame header".to_string(),
            ));
        }
        first_line = false;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeader(format!("malformed header line: {line:?}")));
        };
        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::InvalidHeader(format!("bad Content-Length: {value:?}")))?;
            content_length = Some(length);
        }
    }

    let Some(length) = content_length else {
        return Err(Error::InvalidHeader("missing Content-Length".to_string()));
    };
    let mut body = vec![0u8; length];
    tokio::io::AsyncReadExt::read_exact(reader, &mut body).await?;
    Ok(Some(body))
}

/// Write one frame.
pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn read_all_frames(input: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut reader = BufReader::new(Cursor::new(input.to_vec()));
        let mut frames = Vec::new();
        while let Some(frame) = read_frame(&mut reader).await? {
            frames.push(frame);
        }
        Ok(frames)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"{\"a\":1}").await.unwrap();
        write_frame(&mut wire, b"[]").await.unwrap();
        let frames = read_all_frames(&wire).await.unwrap();
        assert_eq!(frames, vec![b"{\"a\":1}".to_vec(), b"[]".to_vec()]);
    }

    #[tokio::test]
    async fn test_extra_headers_ignored() {
        let wire = b"Content-Type: application/json\r\ncontent-length: 2\r\n\r\nok";
        let frames = read_all_frames(wire).await.unwrap();
        assert_eq!(frames, vec![b"ok".to_vec()]);
    }

    #[tokio::test]
    async fn test_clean_eof() {
        let frames = read_all_frames(b"").await.unwrap();
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_length_is_fatal() {
        let err = read_all_frames(b"Content-Type: x\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[tokio::test]
    async fn test_short_body_is_fatal() {
        let err = read_all_frames(b"Content-Length: 10\r\n\r\nabc")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_malformed_header_is_fatal() {
        let err = read_all_frames(b"garbage\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[tokio::test]
    async fn test_eof_inside_header_is_fatal() {
        let err = read_all_frames(b"Content-Length: 3\r\n").await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }
}
