#![forbid(unsafe_code)]

//! Command-line converter: fetches metadata for a YouTube video or playlist
//! and writes ErsatzTV remote stream descriptors to disk.

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use tubecast_tools::{
    cache::MemoryCache,
    config::{self, DEFAULT_CONFIG_PATH},
    filename::{self, FilenameFormat, SequenceStyle},
    remote_stream::{DEFAULT_SCRIPT_OPTIONS, generate_document},
    validate::{FlatOptions, build_generation_options},
    youtube::{ParsedUrl, YouTubeClient, parse_youtube_url},
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert YouTube videos and playlists into ErsatzTV remote stream YAML files."
)]
struct Cli {
    /// YouTube video or playlist URL.
    url: String,
    #[arg(long, value_enum, default_value_t = DurationModeArg::None)]
    duration_mode: DurationModeArg,
    #[arg(long, value_name = "HH:MM:SS", help = "Duration used with --duration-mode custom")]
    custom_duration: Option<String>,
    #[arg(
        long,
        value_name = "MINUTES",
        help = "Block size used with --duration-mode api-padded (5, 10, 15, or 30)"
    )]
    padding_interval: Option<u32>,
    #[arg(
        long,
        value_name = "HH:MM:SS|custom",
        default_value = "00:00:00",
        help = "Duration written for live broadcasts (00:00:00 means indefinite)"
    )]
    livestream_duration: String,
    #[arg(long, value_name = "HH:MM:SS")]
    custom_livestream_duration: Option<String>,
    #[arg(long, default_value = DEFAULT_SCRIPT_OPTIONS, value_name = "FLAGS")]
    script_options: String,
    #[arg(long, help = "Emit a title field")]
    include_title: bool,
    #[arg(long, help = "Emit a plot field from the video description")]
    include_plot: bool,
    #[arg(long, value_enum, default_value_t = PlotFormatArg::String)]
    plot_format: PlotFormatArg,
    #[arg(long, help = "Emit a year field from the publish date")]
    include_year: bool,
    #[arg(long, value_name = "RATING", help = "Emit a content_rating field")]
    content_rating: Option<String>,
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = FilenameFormatArg::Compact)]
    filename_format: FilenameFormatArg,
    #[arg(
        long,
        value_enum,
        default_value_t = SequenceArg::Prefix,
        help = "Sequential numbering for playlist files"
    )]
    sequence: SequenceArg,
    #[arg(long, help = "Print a single video's YAML to stdout instead of writing a file")]
    stdout: bool,
    #[arg(long, value_name = "KEY", help = "YouTube Data API key (falls back to YOUTUBE_API_KEY, then the config file)")]
    api_key: Option<String>,
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DurationModeArg {
    None,
    Custom,
    Api,
    ApiPadded,
}

impl DurationModeArg {
    fn as_wire(self) -> &'static str {
        match self {
            DurationModeArg::None => "none",
            DurationModeArg::Custom => "custom",
            DurationModeArg::Api => "api",
            DurationModeArg::ApiPadded => "api-padded",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlotFormatArg {
    String,
    Folded,
    Literal,
}

impl PlotFormatArg {
    fn as_wire(self) -> &'static str {
        match self {
            PlotFormatArg::String => "string",
            PlotFormatArg::Folded => "folded",
            PlotFormatArg::Literal => "literal",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilenameFormatArg {
    Original,
    Compact,
    Kebab,
    Snake,
}

impl From<FilenameFormatArg> for FilenameFormat {
    fn from(arg: FilenameFormatArg) -> Self {
        match arg {
            FilenameFormatArg::Original => FilenameFormat::Original,
            FilenameFormatArg::Compact => FilenameFormat::Compact,
            FilenameFormatArg::Kebab => FilenameFormat::Kebab,
            FilenameFormatArg::Snake => FilenameFormat::Snake,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SequenceArg {
    None,
    Prefix,
    Suffix,
}

impl From<SequenceArg> for SequenceStyle {
    fn from(arg: SequenceArg) -> Self {
        match arg {
            SequenceArg::None => SequenceStyle::None,
            SequenceArg::Prefix => SequenceStyle::Prefix,
            SequenceArg::Suffix => SequenceStyle::Suffix,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = build_generation_options(FlatOptions {
        duration_mode: cli.duration_mode.as_wire().to_owned(),
        custom_duration: cli.custom_duration.clone(),
        padding_interval: cli.padding_interval,
        livestream_duration: cli.livestream_duration.clone(),
        custom_livestream_duration: cli.custom_livestream_duration.clone(),
        always_include_live_duration: true,
        script_options: cli.script_options.clone(),
        include_title: cli.include_title,
        include_plot: cli.include_plot,
        plot_format: cli.plot_format.as_wire().to_owned(),
        include_year: cli.include_year,
        include_content_rating: cli.content_rating.is_some(),
        content_rating: cli.content_rating.clone().unwrap_or_default(),
    })?;

    let api_key = resolve_api_key(&cli)?;
    let client = YouTubeClient::new(api_key, Arc::new(MemoryCache::new()));

    let parsed = parse_youtube_url(&cli.url)
        .ok_or_else(|| anyhow!("not a recognizable YouTube video or playlist URL: {}", cli.url))?;

    match parsed {
        ParsedUrl::Video { id } => {
            let metadata = client.video_metadata(&id)?;
            let yaml = generate_document(&metadata, &options);

            if cli.stdout {
                println!("{yaml}");
                return Ok(());
            }

            let name = filename::format_filename(&metadata.title, cli.filename_format.into());
            let path = write_descriptor(&cli.output_dir, &name, &yaml)?;
            println!("Wrote {}", path.display());
        }
        ParsedUrl::Playlist { id } => {
            if cli.stdout {
                bail!("--stdout only applies to single videos");
            }

            let video_ids = client.playlist_video_ids(&id)?;
            println!("Playlist {id}: {} videos", video_ids.len());

            let mut written = 0usize;
            for (index, video_id) in video_ids.iter().enumerate() {
                match client.video_metadata(video_id) {
                    Ok(metadata) => {
                        let yaml = generate_document(&metadata, &options);
                        let name = filename::playlist_filename(
                            &metadata.title,
                            index,
                            cli.filename_format.into(),
                            cli.sequence.into(),
                        );
                        let path = write_descriptor(&cli.output_dir, &name, &yaml)?;
                        println!("[{}/{}] {}", index + 1, video_ids.len(), path.display());
                        written += 1;
                    }
                    Err(err) => eprintln!("Skipping video {video_id}: {err:#}"),
                }
            }

            println!("Done: {written}/{} descriptors written", video_ids.len());
        }
    }

    Ok(())
}

/// Key precedence: `--api-key` flag, then `YOUTUBE_API_KEY`, then the config
/// file.
fn resolve_api_key(cli: &Cli) -> Result<String> {
    if let Some(key) = &cli.api_key {
        return Ok(key.clone());
    }
    if let Ok(key) = env::var("YOUTUBE_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    config::read_env_config(&cli.config)?
        .and_then(|cfg| cfg.youtube_api_key)
        .ok_or_else(|| {
            anyhow!(
                "no API key: pass --api-key, set YOUTUBE_API_KEY, or add it to {}",
                cli.config.display()
            )
        })
}

fn write_descriptor(dir: &Path, name: &str, yaml: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    let path = dir.join(format!("{name}.yml"));
    fs::write(&path, yaml).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
