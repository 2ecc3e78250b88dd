use std::path::PathBuf;

use clap::ValueHint;
use tds_core::decode_options::{DecodeOptions, NormalMode};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum LogFormat {
    Compact,
    Full,
    Pretty,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => f.write_str("compact"),
            LogFormat::Full => f.write_str("full"),
            LogFormat::Pretty => f.write_str("pretty"),
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Print what a 3DS file decodes to")]
pub struct Cli {
    /// Logging output filters; comma-separated
    #[arg(
        short,
        long,
        default_value = "warn,tds_io=info,tds_info=info",
        env = "TDS_LOG_FILTER"
    )]
    pub log_filter: String,
    /// Logging output format
    #[arg(long, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
    /// Normal generation: none, flat or smooth
    #[arg(short, long, default_value = "flat", value_parser = parse_normal_mode)]
    pub normals: NormalMode,
    /// Emit indexed batches over shared vertices
    #[arg(long)]
    pub indexed: bool,
    /// Translate the scene so its bounding box is centred on the origin
    #[arg(long)]
    pub center: bool,
    /// Scale the scene so its largest extent equals this size
    #[arg(long, default_value_t = 0.0, value_name = "SIZE")]
    pub target_size: f32,
    /// Ignore material entries and groups
    #[arg(long)]
    pub no_materials: bool,
    /// Ignore texture maps
    #[arg(long)]
    pub no_textures: bool,
    /// Build edge adjacency and report boundary edges
    #[arg(long)]
    pub adjacency: bool,
    /// Chunk-level tracing: 1 logs skipped chunks, 2 logs every chunk
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub debug_level: u8,
    /// List every batch of every object
    #[arg(short, long)]
    pub batches: bool,
    /// Files to inspect
    #[arg(num_args = 1.., required = true, value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,
}

fn parse_normal_mode(s: &str) -> Result<NormalMode, String> {
    s.parse().map_err(|e| format!("{}", e))
}

impl Cli {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::default()
            .with_normal_mode(self.normals)
            .with_indexed_output(self.indexed)
            .with_center_model(self.center)
            .with_target_size(self.target_size)
            .with_materials(!self.no_materials)
            .with_textures(!self.no_textures)
            .with_adjacency(self.adjacency)
            .with_debug_level(self.debug_level)
    }
}

/// Log to stderr so stdout carries only the report.
pub(crate) fn initialize_tracing(log_filter: &str, log_format: LogFormat) {
    let tsub = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(log_filter);

    match log_format {
        LogFormat::Compact => tsub.compact().init(),
        LogFormat::Full => tsub.init(),
        LogFormat::Pretty => tsub.pretty().init(),
    }
}
