//! Shared fixtures: a recording media tool and upstream mocks.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use streamclip::cache::PlaylistCache;
use streamclip::clipper::{Clipper, ClipperParts};
use streamclip::error::{ClipError, Result};
use streamclip::media::MediaTool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Media tool that records its inputs and writes placeholder outputs.
#[derive(Default)]
pub struct RecordingTool {
    pub transcodes: Mutex<Vec<Vec<u8>>>,
    pub frames: Mutex<Vec<(PathBuf, PathBuf)>>,
    /// Paths the preview input existed at when extract_frame ran
    pub frame_inputs_existed: Mutex<Vec<bool>>,
    pub fail: bool,
}

impl RecordingTool {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn transcode_calls(&self) -> usize {
        self.transcodes.lock().unwrap().len()
    }

    pub fn frame_calls(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaTool for RecordingTool {
    async fn transcode(&self, bodies: Vec<Bytes>, output: &Path) -> Result<()> {
        let stream: Vec<u8> = bodies.iter().flat_map(|b| b.iter().copied()).collect();
        self.transcodes.lock().unwrap().push(stream);
        std::fs::write(output, b"mp4")?;
        if self.fail {
            return Err(ClipError::Assembly("exit status: 1".to_string()));
        }
        Ok(())
    }

    async fn extract_frame(&self, input: &Path, output: &Path) -> Result<()> {
        self.frames
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        self.frame_inputs_existed.lock().unwrap().push(input.exists());
        if self.fail {
            // ffmpeg can get partway through the image before it dies
            std::fs::write(output, b"jp")?;
            return Err(ClipError::Assembly("exit status: 1".to_string()));
        }
        std::fs::write(output, b"jpg")?;
        Ok(())
    }
}

pub fn manifest_for(server: &MockServer, channel: &str) -> String {
    format!(
        "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=6000000,RESOLUTION=1920x1080\n\
{}/playlist/{}.m3u8\n",
        server.uri(),
        channel
    )
}

/// Media playlist with one live entry per segment name, plus an ad entry.
pub fn playlist_for(server: &MockServer, names: &[&str]) -> String {
    let mut body = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n#EXT-X-MEDIA-SEQUENCE:1\n");
    body.push_str(&format!(
        "#EXTINF:2.000,Amazon|ad\n{}/ad/skip.ts\n",
        server.uri()
    ));
    for name in names {
        body.push_str(&format!("#EXTINF:2.000,live\n{}/seg/{}\n", server.uri(), name));
    }
    body
}

pub async fn mount_manifest(server: &MockServer, channel: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/live/{channel}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest_for(server, channel)))
        .mount(server)
        .await;
}

pub async fn mount_playlist(server: &MockServer, channel: &str, names: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/playlist/{channel}.m3u8")))
        .respond_with(ResponseTemplate::new(200).set_body_string(playlist_for(server, names)))
        .mount(server)
        .await;
}

pub async fn mount_segment(server: &MockServer, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/seg/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.as_bytes().to_vec()))
        .mount(server)
        .await;
}

pub fn clipper(
    server: &MockServer,
    tool: Arc<dyn MediaTool>,
    clips_dir: &Path,
    previews_dir: &Path,
) -> Clipper {
    Clipper::new(ClipperParts {
        client: reqwest::Client::new(),
        cache: PlaylistCache::default(),
        upstream_base_url: format!("{}/live", server.uri()),
        resolve_max_attempts: 3,
        clips_dir: clips_dir.to_path_buf(),
        previews_dir: previews_dir.to_path_buf(),
        tool,
    })
}
