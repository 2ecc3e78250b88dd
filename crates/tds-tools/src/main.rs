//! `tds-info`: decodes 3DS files and prints what came out.

mod cli;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tds_core::decode_options::DecodeOptions;
use tds_core::emitted_scene::{Batch, EmittedScene};
use tds_core::status::DecodeError;
use tds_io::{Reader, TdsReader};
use tracing::{error, info};

use crate::cli::Cli;

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("{}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("failed to write report: {0}")]
    Report(#[from] io::Error),
}

fn describe_batch(batch: &Batch) -> String {
    match batch {
        Batch::Material { id, material } => format!("material {} '{}'", id.0, material.name),
        Batch::Texture(Some(name)) => format!("texture '{}'", name),
        Batch::Texture(None) => "texture off".to_string(),
        Batch::TextureTransform(t) => format!(
            "texture-transform scale=({}, {}) offset=({}, {})",
            t.scale[0], t.scale[1], t.offset[0], t.offset[1]
        ),
        Batch::IndexedTriangles(t) => format!(
            "indexed-triangles {} ({:?} normals)",
            t.triangle_count(),
            t.normal_binding
        ),
        Batch::FlatTriangles(t) => format!(
            "flat-triangles {} ({:?} normals, {} uvs)",
            t.triangle_count(),
            t.normal_binding,
            t.tex_coords.len()
        ),
    }
}

fn write_report<W: Write>(
    out: &mut W,
    path: &Path,
    scene: &EmittedScene,
    reader: &TdsReader,
    list_batches: bool,
) -> io::Result<()> {
    writeln!(out, "{}", path.display())?;
    writeln!(out, "  {}", reader.diagnostics())?;
    if let Some(version) = scene.info.version {
        writeln!(out, "  version {}", version)?;
    }
    if scene.bounds.is_valid() {
        let (min, max) = (scene.bounds.min(), scene.bounds.max());
        writeln!(
            out,
            "  bounds ({}, {}, {}) .. ({}, {}, {})",
            min.x, min.y, min.z, max.x, max.y, max.z
        )?;
    }
    if let Some(transform) = &scene.transform {
        let t = transform.translation;
        writeln!(
            out,
            "  transform translate=({}, {}, {}) scale={}",
            t.x, t.y, t.z, transform.scale
        )?;
    }
    for object in &scene.objects {
        writeln!(
            out,
            "  object '{}': {} triangles, {} batches",
            object.name.as_deref().unwrap_or("<unnamed>"),
            object.triangle_count(),
            object.batches.len()
        )?;
        if list_batches {
            for batch in &object.batches {
                writeln!(out, "    {}", describe_batch(batch))?;
            }
        }
    }
    Ok(())
}

fn inspect<W: Write>(
    out: &mut W,
    path: &Path,
    options: &DecodeOptions,
    list_batches: bool,
) -> Result<(), ToolError> {
    let decode_err = |source: DecodeError| ToolError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = TdsReader::open(path)
        .map_err(decode_err)?
        .with_options(options.clone());
    let result = reader.read_scene();
    info!(file = %path.display(), diagnostics = %reader.diagnostics(), "decoded");
    let scene = result.map_err(decode_err)?;
    write_report(out, path, &scene, &reader, list_batches)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::initialize_tracing(&cli.log_filter, cli.log_format);

    let options = cli.decode_options();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;
    for path in &cli.files {
        if let Err(e) = inspect(&mut out, path, &options, cli.batches) {
            error!("{}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
