use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use serde::Serialize;

use crate::error::{CoreError, Result};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EncodingGuess {
    pub name: String,
    pub confidence: f32,
}

/// Best guess for bytes that are not UTF-8.
pub fn guess(bytes: &[u8]) -> EncodingGuess {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);

    let encoding = detector.guess(None, true);
    EncodingGuess {
        name: encoding.name().to_lowercase(),
        confidence: estimate_confidence(bytes, encoding),
    }
}

/// Dataset files are UTF-8. A leading BOM is dropped; anything else that
/// fails to decode is reported with the encoding it most likely is, so the
/// operator can convert the file instead of having it rewritten.
pub fn decode_dataset(path: &Path, bytes: Vec<u8>) -> Result<String> {
    let bytes = if bytes.starts_with(&UTF8_BOM) {
        bytes[UTF8_BOM.len()..].to_vec()
    } else {
        bytes
    };

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            let g = guess(e.as_bytes());
            Err(CoreError::Parse {
                path: path.to_path_buf(),
                message: format!(
                    "file is not valid UTF-8 (looks like {}, confidence {:.2})",
                    g.name, g.confidence
                ),
            })
        }
    }
}

fn estimate_confidence(bytes: &[u8], encoding: &'static Encoding) -> f32 {
    let (text, _, had_errors) = encoding.decode(bytes);

    if had_errors {
        return 0.35;
    }

    let len = text.len();
    if len < 64 {
        0.55
    } else if len < 512 {
        0.70
    } else if len < 4096 {
        0.82
    } else {
        0.90
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("[]".as_bytes());
        assert_eq!(decode_dataset(Path::new("x.json"), bytes).unwrap(), "[]");
    }

    #[test]
    fn keeps_plain_utf8() {
        let text = "[{\"chinese\": \"你好\"}]";
        let out = decode_dataset(Path::new("x.json"), text.as_bytes().to_vec()).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn rejects_legacy_encoding_with_a_guess() {
        let (bytes, _, _) = encoding_rs::GBK.encode("[{\"chinese\": \"你好，世界\"}]");
        let err = decode_dataset(Path::new("x.json"), bytes.into_owned()).unwrap_err();
        match err {
            CoreError::Parse { message, .. } => assert!(message.contains("not valid UTF-8")),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }
}
