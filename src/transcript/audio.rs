//! Audio download and cropping via yt-dlp and ffmpeg.

use crate::error::{CourseGenError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// File stem used for the downloaded audio inside the working directory.
const AUDIO_STEM: &str = "audio";

/// Prefer an audio-only stream, else take the best combined one.
const AUDIO_FORMAT: &str = "bestaudio/best";

fn download_args(url: &str, template: &Path) -> Vec<OsString> {
    vec![
        "-f".into(),
        AUDIO_FORMAT.into(),
        "--output".into(),
        template.as_os_str().to_owned(),
        "--no-playlist".into(),
        "--quiet".into(),
        "--no-warnings".into(),
        url.into(),
    ]
}

/// Download the best available audio stream of `url` into `output_dir`.
///
/// Returns the path of the downloaded file, whatever container yt-dlp chose.
#[instrument(skip(output_dir))]
pub async fn download_audio(url: &str, output_dir: &Path) -> Result<PathBuf> {
    info!("Downloading audio");

    let template = output_dir.join(format!("{}.%(ext)s", AUDIO_STEM));

    let result = Command::new("yt-dlp")
        .args(download_args(url, &template))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CourseGenError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(CourseGenError::AudioDownload(format!(
                "yt-dlp execution failed: {e}"
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CourseGenError::AudioDownload(format!(
            "yt-dlp failed: {}",
            stderr.trim()
        )));
    }

    find_downloaded(output_dir)
}

/// Locate the file yt-dlp wrote into `dir`.
fn find_downloaded(dir: &Path) -> Result<PathBuf> {
    let prefix = format!("{}.", AUDIO_STEM);
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CourseGenError::AudioDownload(format!("Cannot read directory: {e}")))?;

    entries
        .flatten()
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy().starts_with(&prefix))
                .unwrap_or(false)
                && path.extension().map(|e| e != "part").unwrap_or(false)
        })
        .ok_or_else(|| CourseGenError::AudioDownload("Audio file not found after download".into()))
}

/// ffmpeg arguments that keep the first `clip_seconds` of `source` as mono WAV.
fn crop_args(source: &Path, dest: &Path, clip_seconds: u32, sample_rate: u32) -> Vec<OsString> {
    vec![
        "-i".into(),
        source.as_os_str().to_owned(),
        "-t".into(),
        clip_seconds.to_string().into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        sample_rate.to_string().into(),
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        dest.as_os_str().to_owned(),
    ]
}

/// Crop `source` to its first `clip_seconds` as mono `sample_rate` Hz WAV at `dest`.
#[instrument(skip_all, fields(clip_seconds, sample_rate))]
pub async fn crop_audio(
    source: &Path,
    dest: &Path,
    clip_seconds: u32,
    sample_rate: u32,
) -> Result<()> {
    debug!("Cropping {:?}", source);

    let result = Command::new("ffmpeg")
        .args(crop_args(source, dest, clip_seconds, sample_rate))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(CourseGenError::AudioDownload(format!(
                "ffmpeg crop failed: {}",
                err.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CourseGenError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(CourseGenError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_args() {
        let args = crop_args(Path::new("/tmp/x/audio.webm"), Path::new("/tmp/x/clip.wav"), 180, 16000);
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "-i", "/tmp/x/audio.webm", "-t", "180", "-ac", "1", "-ar", "16000", "-y",
                "-loglevel", "error", "/tmp/x/clip.wav"
            ]
        );
    }

    #[test]
    fn test_download_args_fall_back_to_combined_stream() {
        let args: Vec<String> = download_args("https://youtu.be/abc", Path::new("/tmp/x/audio.%(ext)s"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(&args[..2], ["-f", "bestaudio/best"]);
        assert_eq!(args[3], "/tmp/x/audio.%(ext)s");
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }

    #[test]
    fn test_find_downloaded_skips_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("audio.webm.part"), b"").unwrap();
        std::fs::write(dir.path().join("other.txt"), b"").unwrap();
        assert!(find_downloaded(dir.path()).is_err());

        std::fs::write(dir.path().join("audio.m4a"), b"data").unwrap();
        let found = find_downloaded(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "audio.m4a");
    }
}
