use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Alignment window in milliseconds (overrides the configuration)
    #[arg(long, global = true)]
    pub threshold_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge two local subtitle files into one bilingual file
    Merge {
        /// Subtitle file shown as the main line
        #[arg(short, long)]
        primary: PathBuf,

        /// Subtitle file shown in italics below the main line
        #[arg(short, long)]
        secondary: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,

        /// Language of the primary file, as a code or "Name [code]"
        #[arg(long)]
        primary_lang: Option<String>,

        /// Language of the secondary file, as a code or "Name [code]"
        #[arg(long)]
        secondary_lang: Option<String>,
    },

    /// Download subtitles for a title and merge them
    Fetch {
        /// IMDb id, optionally with season and episode (tt0903747:1:2)
        #[arg(long)]
        id: String,

        /// Content type
        #[arg(long, default_value = "movie")]
        kind: String,

        /// Season number for series
        #[arg(long)]
        season: Option<u32>,

        /// Episode number for series
        #[arg(long)]
        episode: Option<u32>,

        /// Main language, e.g. "English [eng]"
        #[arg(long)]
        primary: Option<String>,

        /// Translation language, e.g. "Turkish [tur]"
        #[arg(long)]
        secondary: Option<String>,

        /// Directory for the merged SRT files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Maximum number of merged versions
        #[arg(long)]
        max_versions: Option<usize>,

        /// Merge this listed primary file instead of ranking
        #[arg(long, requires = "secondary_id")]
        primary_id: Option<String>,

        /// Merge this listed secondary file instead of ranking
        #[arg(long, requires = "primary_id")]
        secondary_id: Option<String>,

        /// Video filename hint for the subtitle search
        #[arg(long)]
        filename: Option<String>,

        /// Video size hint in bytes
        #[arg(long)]
        video_size: Option<u64>,

        /// OpenSubtitles video hash hint
        #[arg(long)]
        video_hash: Option<String>,
    },

    /// Convert a subtitle file of unknown encoding to UTF-8
    Decode {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output UTF-8 file
        #[arg(short, long)]
        output: PathBuf,

        /// Language hint for legacy codepages
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// List selectable languages
    Languages,
}
