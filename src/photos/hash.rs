use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 8 * 1024;

/// SHA-256 digest of a photo's bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

#[derive(Debug, thiserror::Error)]
#[error("invalid content hash: {0}")]
pub struct InvalidHash(String);

impl ContentHash {
    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, InvalidHash> {
        if s.len() != 64 {
            return Err(InvalidHash(format!("expected 64 hex characters, got {}", s.len())));
        }
        let bytes = hex::decode(s).map_err(|e| InvalidHash(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| InvalidHash("decoded to wrong length".into()))?;
        Ok(Self(arr))
    }

    /// Lowercase hex form, as stored in the photo index.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash everything `reader` yields, chunk by chunk. A read error is returned
/// as is; no digest is produced for partially read input.
pub async fn hash_reader<R>(mut reader: R) -> std::io::Result<ContentHash>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(ContentHash(hasher.finalize().into()))
}

/// Hash buffered content. Reads through a slice view so the caller keeps its
/// own handle on the bytes for uploading.
pub async fn hash_bytes(content: &Bytes) -> std::io::Result<ContentHash> {
    hash_reader(content.as_ref()).await
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Yields some bytes, then fails.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.sent {
                Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "stream closed",
                )))
            } else {
                self.sent = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    #[tokio::test]
    async fn known_digest() {
        let hash = hash_bytes(&Bytes::from_static(b"hello world")).await.unwrap();
        assert_eq!(
            hash.to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn streaming_matches_one_shot() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = hash_reader(std::io::Cursor::new(data.clone())).await.unwrap();
        let expected: [u8; 32] = Sha256::digest(&data).into();
        assert_eq!(streamed.as_bytes(), &expected);
    }

    #[tokio::test]
    async fn different_content_differs() {
        let a = hash_bytes(&Bytes::from_static(b"cat")).await.unwrap();
        let b = hash_bytes(&Bytes::from_static(b"dog")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn read_error_is_propagated() {
        let err = hash_reader(BrokenReader { sent: false }).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn hex_parsing() {
        let hex = "ab".repeat(32);
        let hash = ContentHash::from_hex(&hex).unwrap();
        assert_eq!(hash.to_string(), hex);
        assert!(ContentHash::from_hex("abc").is_err());
        assert!(ContentHash::from_hex(&"zz".repeat(32)).is_err());
    }
}
