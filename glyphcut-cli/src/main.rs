//! Crop every glyph of a PAGE XML document out of its page image.

use clap::{Parser, ValueEnum};
use glyphcut::{Compression, ExtractSettings, Resolution, WriteMode};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "glyphcut",
    version,
    about = "Crop glyph images out of a page scan into bi-level TIFF files"
)]
struct Cli {
    /// The page image.
    #[arg(short, long)]
    image: PathBuf,
    /// The PAGE XML document describing the glyphs.
    #[arg(short = 'x', long)]
    xml: PathBuf,
    /// The folder to write the glyph images to. It has to exist.
    #[arg(short, long)]
    output: PathBuf,
    /// Keep the colors of the page instead of inverting them.
    #[arg(long)]
    no_invert: bool,
    /// The compression of the output files.
    #[arg(long, value_enum, default_value_t = CompressionArg::G4)]
    compression: CompressionArg,
    /// How rows are passed to the compressor.
    #[arg(long, value_enum, default_value_t = WriteModeArg::Scanline)]
    write_mode: WriteModeArg,
    /// The resolution stored in the output files, in dots per inch.
    #[arg(long, default_value_t = 96, value_parser = clap::value_parser!(u32).range(1..))]
    dpi: u32,
    /// Process one glyph after the other.
    #[arg(long)]
    sequential: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    /// CCITT Group 4.
    G4,
    /// Uncompressed.
    None,
}

#[derive(Clone, Copy, ValueEnum)]
enum WriteModeArg {
    Scanline,
    Strip,
}

impl Cli {
    fn settings(&self) -> ExtractSettings {
        ExtractSettings {
            invert_colors: !self.no_invert,
            compression: match self.compression {
                CompressionArg::G4 => Compression::CcittGroup4,
                CompressionArg::None => Compression::None,
            },
            write_mode: match self.write_mode {
                WriteModeArg::Scanline => WriteMode::Scanline,
                WriteModeArg::Strip => WriteMode::Strip,
            },
            resolution: Resolution::uniform(self.dpi),
            parallel: !self.sequential,
            ..ExtractSettings::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Problems with single glyphs are logged as they happen and don't fail the run.
    match glyphcut::run(&cli.image, &cli.xml, &cli.output, cli.settings()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["glyphcut", "-i", "a.png", "-x", "a.xml", "-o", "out"]).unwrap();

        assert_eq!(cli.image, PathBuf::from("a.png"));
        assert_eq!(cli.settings(), ExtractSettings::default());
    }

    #[test]
    fn flags_map_onto_settings() {
        let cli = Cli::try_parse_from([
            "glyphcut",
            "--image",
            "a.png",
            "--xml",
            "a.xml",
            "--output",
            "out",
            "--no-invert",
            "--compression",
            "none",
            "--write-mode",
            "strip",
            "--dpi",
            "300",
            "--sequential",
        ])
        .unwrap();
        let settings = cli.settings();

        assert!(!settings.invert_colors);
        assert_eq!(settings.compression, Compression::None);
        assert_eq!(settings.write_mode, WriteMode::Strip);
        assert_eq!(settings.resolution, Resolution::uniform(300));
        assert!(!settings.parallel);
    }

    #[test]
    fn zero_dpi_is_rejected() {
        let args = ["glyphcut", "-i", "a.png", "-x", "a.xml", "-o", "out", "--dpi"];

        assert!(Cli::try_parse_from(args.into_iter().chain(["0"])).is_err());
        assert!(Cli::try_parse_from(args.into_iter().chain(["1"])).is_ok());
    }

    #[test]
    fn paths_are_required() {
        assert!(Cli::try_parse_from(["glyphcut", "-i", "a.png"]).is_err());
    }
}
