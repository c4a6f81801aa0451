//! Load an image or PDF and turn it into base64 inline data.

use crate::error::Failure;
use crate::provider::InlineData;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Pdf,
}

impl FileType {
    pub fn label(&self) -> &'static str {
        match self {
            FileType::Image => "Image",
            FileType::Pdf => "PDF",
        }
    }
}

/// Fetch `location` (http(s) URL, `data:` URL, `file://` URL or local path).
pub async fn load_inline(
    http: &reqwest::Client,
    location: &str,
    file_type: FileType,
) -> Result<InlineData, Failure> {
    let location = location.trim();
    let (bytes, declared_mime, name_hint) = if let Some(rest) = location.strip_prefix("data:") {
        return from_data_url(rest, file_type);
    } else if location.starts_with("http://") || location.starts_with("https://") {
        let (bytes, mime) = fetch_remote(http, location).await?;
        let path = Url::parse(location)
            .map(|u| PathBuf::from(u.path()))
            .unwrap_or_default();
        (bytes, mime, path)
    } else {
        let path = match location.strip_prefix("file://") {
            Some(_) => Url::parse(location)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| Failure::Fetch(format!("bad file URL: {location}")))?,
            None => PathBuf::from(location),
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Failure::Fetch(format!("{}: {e}", path.display())))?;
        (bytes, None, path)
    };

    let mime_type = resolve_mime(file_type, declared_mime.as_deref(), &name_hint)
        .ok_or_else(|| Failure::Fetch(format!("could not determine image type of {location}")))?;

    tracing::debug!(%mime_type, bytes = bytes.len(), "loaded file for inline upload");
    Ok(InlineData {
        base64_content: STANDARD.encode(&bytes),
        mime_type,
    })
}

async fn fetch_remote(
    http: &reqwest::Client,
    url: &str,
) -> Result<(Vec<u8>, Option<String>), Failure> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| Failure::Fetch(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Failure::Fetch(format!("{url}: HTTP {status}")));
    }

    let mime = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| Failure::Fetch(e.to_string()))?;
    Ok((bytes.to_vec(), mime))
}

/// `rest` is everything after `data:`.
fn from_data_url(rest: &str, file_type: FileType) -> Result<InlineData, Failure> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Failure::Fetch("malformed data URL".to_string()))?;

    let (media, is_base64) = match header.strip_suffix(";base64") {
        Some(media) => (media, true),
        None => (header, false),
    };

    let base64_content = if is_base64 {
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(&cleaned)
            .map_err(|e| Failure::Fetch(format!("data URL is not valid base64: {e}")))?;
        cleaned
    } else {
        STANDARD.encode(payload.as_bytes())
    };

    let mime_type = resolve_mime(file_type, Some(media), Path::new(""))
        .ok_or_else(|| Failure::Fetch("could not determine image type of data URL".to_string()))?;

    Ok(InlineData {
        base64_content,
        mime_type,
    })
}

fn resolve_mime(file_type: FileType, declared: Option<&str>, name: &Path) -> Option<String> {
    if file_type == FileType::Pdf {
        return Some("application/pdf".to_string());
    }

    let declared = declared
        .and_then(|m| m.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| m.starts_with("image/"));
    if declared.is_some() {
        return declared;
    }

    let ext = name.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[tokio::test]
    async fn test_base64_data_url() {
        let http = reqwest::Client::new();
        let data = load_inline(&http, "data:image/png;base64,iVBORw0KGgo=", FileType::Image)
            .await
            .unwrap();
        assert_eq!(data.base64_content, "iVBORw0KGgo=");
        assert_eq!(data.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_plain_data_url_is_encoded() {
        let http = reqwest::Client::new();
        let data = load_inline(&http, "data:image/svg+xml,<svg/>", FileType::Image)
            .await
            .unwrap();
        assert_eq!(data.base64_content, STANDARD.encode("<svg/>"));
        assert_eq!(data.mime_type, "image/svg+xml");
    }

    #[tokio::test]
    async fn test_bad_base64_data_url() {
        let http = reqwest::Client::new();
        let err = load_inline(&http, "data:image/png;base64,@@@", FileType::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, Failure::Fetch(_)));
    }

    #[tokio::test]
    async fn test_local_file_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.PNG");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let http = reqwest::Client::new();
        let data = load_inline(&http, path.to_str().unwrap(), FileType::Image)
            .await
            .unwrap();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(STANDARD.decode(data.base64_content).unwrap(), PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_local_file_unknown_image_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"xx").unwrap();

        let http = reqwest::Client::new();
        let err = load_inline(&http, path.to_str().unwrap(), FileType::Image)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not determine image type"));
    }

    #[tokio::test]
    async fn test_local_pdf_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let http = reqwest::Client::new();
        let data = load_inline(&http, path.to_str().unwrap(), FileType::Pdf)
            .await
            .unwrap();
        assert_eq!(data.mime_type, "application/pdf");
        assert_eq!(data.base64_content, STANDARD.encode(b"%PDF-1.7"));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let http = reqwest::Client::new();
        let err = load_inline(&http, "/definitely/not/here.png", FileType::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, Failure::Fetch(_)));
    }

    #[tokio::test]
    async fn test_remote_uses_content_type() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/img/cat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg; qs=0.8")
                    .set_body_bytes(vec![0xff, 0xd8, 0xff]),
            )
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let data = load_inline(&http, &format!("{}/img/cat", server.uri()), FileType::Image)
            .await
            .unwrap();
        assert_eq!(data.mime_type, "image/jpeg");
        assert_eq!(data.base64_content, STANDARD.encode([0xff, 0xd8, 0xff]));
    }

    #[tokio::test]
    async fn test_remote_error_status() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let err = load_inline(&http, &format!("{}/gone.pdf", server.uri()), FileType::Pdf)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
