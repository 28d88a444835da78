use std::path::Path;

use tracklang_media::{check_ffmpeg, check_ffprobe, VoiceActivityFilter, TARGET_SAMPLE_RATE};
use tracklang_worker::{check_model, AnalyzerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AnalyzerConfig::from_env();
    config.validate()?;

    println!(
        "tracklang-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_tools()?;
    VoiceActivityFilter::new(config.vad.clone()).check(TARGET_SAMPLE_RATE)?;

    let backend = check_model(&config.oracle).await?;
    println!("tracklang-selfcheck: language model '{}' ready", backend);

    println!("tracklang-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let marker = tempfile::Builder::new().prefix("selfcheck-").tempfile_in(path)?;
    drop(marker);
    Ok(())
}

fn ensure_tools() -> anyhow::Result<()> {
    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!(
        "tracklang-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );
    Ok(())
}
