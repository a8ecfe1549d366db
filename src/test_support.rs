//! Shared helpers for request-level tests

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};

use crate::compressor::PdfCompressor;
use crate::config::Config;
use crate::state::AppState;

pub const BOUNDARY: &str = "----pdf-compress-test-boundary";

/// One multipart part
pub struct Part<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Config pointing the upload and static directories into `dir`
pub fn test_config(dir: &Path, max_upload_bytes: u64) -> Config {
    let mut config = Config::default();
    config.storage.upload_dir = dir.join("uploads");
    config.storage.max_upload_bytes = max_upload_bytes;
    config.server.static_dir = dir.join("public");
    config
}

pub async fn test_state(
    dir: &Path,
    max_upload_bytes: u64,
    compressor: Arc<dyn PdfCompressor>,
) -> AppState {
    AppState::new(test_config(dir, max_upload_bytes), compressor)
        .await
        .unwrap()
}

/// Names of every entry currently in the upload directory
pub fn upload_dir_entries(state: &AppState) -> Vec<String> {
    std::fs::read_dir(state.store().root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

/// Minimal bytes that pass the upload signature check
pub fn fake_pdf(marker: &str) -> Vec<u8> {
    format!("%PDF-1.4\n% {}\n1 0 obj << >> endobj\n%%EOF\n", marker).into_bytes()
}

/// Write an executable shell script standing in for Ghostscript.
///
/// The script parses `$output` and `$input` out of the real argument list
/// before running `body`. It is only handed out once it can be exec'd: a
/// parallel test forking while the file is open for writing leaves a
/// writable descriptor behind, and exec then fails with ETXTBSY.
#[cfg(unix)]
pub fn fake_ghostscript(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    const ETXTBSY: i32 = 26;

    let path = dir.join("fake-gs");
    let script = format!(
        "#!/bin/sh\n\
         [ \"$1\" = \"--ready\" ] && exit 0\n\
         for arg in \"$@\"; do\n\
           case \"$arg\" in\n\
             -sOutputFile=*) output=\"${{arg#-sOutputFile=}}\" ;;\n\
           esac\n\
           input=\"$arg\"\n\
         done\n\
         {}\n",
        body
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    for _ in 0..100 {
        match std::process::Command::new(&path).arg("--ready").status() {
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(Duration::from_millis(10));
            }
            result => {
                assert!(result.unwrap().success());
                return path;
            }
        }
    }
    panic!("{} stayed busy", path.display());
}
