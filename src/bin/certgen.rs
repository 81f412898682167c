//! CLI for certgen - inspect data files and render certificate archives
//!
//! Usage:
//!   certgen inspect <data.xlsx|csv>               # Table JSON to stdout
//!   certgen names <data> --pattern "{Name}_Cert"  # Archive entry names
//!   certgen render --template t.png --data d.xlsx --layout l.json --font f.ttf

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::fs;
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;

    use clap::{Parser, Subcommand};
    use tracing::Level;

    use certgen::editor::Editor;
    use certgen::error::{CertgenError, Result};
    use certgen::export::ExportOptions;
    use certgen::parser::parse_data_table;
    use certgen::render::{FontBook, ImageRasterizer};
    use certgen::session::Layout;
    use certgen::EditorConfig;

    #[derive(Parser, Debug)]
    #[command(name = "certgen", version, about = "Batch-render certificates from a template and a spreadsheet")]
    struct Cli {
        /// More log output on stderr (-v info, -vv debug, -vvv trace).
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        cmd: Command,
    }

    #[derive(Subcommand, Debug)]
    enum Command {
        /// Print the parsed data table as JSON.
        Inspect(InspectArgs),
        /// Print the archive entry name of every row.
        Names(NamesArgs),
        /// Render one PNG per row into a zip archive.
        Render(RenderArgs),
    }

    #[derive(Parser, Debug)]
    struct InspectArgs {
        /// XLSX, CSV or TSV file.
        data: PathBuf,

        /// Single-line JSON.
        #[arg(long)]
        compact: bool,
    }

    #[derive(Parser, Debug)]
    struct NamesArgs {
        /// XLSX, CSV or TSV file.
        data: PathBuf,

        /// File name pattern; `{Column}` tokens are replaced per row.
        #[arg(long, default_value = "")]
        pattern: String,
    }

    #[derive(Parser, Debug)]
    struct RenderArgs {
        /// Template image (PNG or JPEG).
        #[arg(long)]
        template: PathBuf,

        /// XLSX, CSV or TSV file.
        #[arg(long)]
        data: PathBuf,

        /// Placeholder layout JSON.
        #[arg(long)]
        layout: PathBuf,

        /// Font used for every family without a `--font-map` entry.
        #[arg(long)]
        font: PathBuf,

        /// Extra fonts as `Family=path/to/font.ttf`.
        #[arg(long = "font-map", value_parser = parse_font_mapping)]
        font_map: Vec<(String, PathBuf)>,

        /// File name pattern; defaults to `{<first column>}_Certificate`.
        #[arg(long, default_value = "")]
        pattern: String,

        /// Editor configuration JSON.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output archive; defaults to the configured archive name.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail when two rows produce the same file name.
        #[arg(long)]
        reject_duplicates: bool,
    }

    fn parse_font_mapping(s: &str) -> std::result::Result<(String, PathBuf), String> {
        let (family, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected Family=path, got '{s}'"))?;
        let family = family.trim();
        if family.is_empty() {
            return Err(format!("missing family name in '{s}'"));
        }
        Ok((family.to_string(), PathBuf::from(path.trim())))
    }

    fn init_logging(verbose: u8) {
        let level = match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    }

    fn read(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| {
            CertgenError::Io(io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })
    }

    fn read_string(path: &Path) -> Result<String> {
        String::from_utf8(read(path)?)
            .map_err(|_| CertgenError::Parse(format!("{} is not UTF-8", path.display())))
    }

    fn cmd_inspect(args: &InspectArgs) -> Result<()> {
        let table = parse_data_table(&read(&args.data)?)?;
        let json = if args.compact {
            serde_json::to_string(&table)?
        } else {
            serde_json::to_string_pretty(&table)?
        };
        let mut out = io::stdout().lock();
        writeln!(out, "{json}")?;
        Ok(())
    }

    fn cmd_names(args: &NamesArgs) -> Result<()> {
        let table = parse_data_table(&read(&args.data)?)?;
        let mut out = io::stdout().lock();
        for name in certgen::export::preview_filenames(&table, &args.pattern) {
            writeln!(out, "{name}")?;
        }
        Ok(())
    }

    fn cmd_render(args: &RenderArgs) -> Result<()> {
        let config = match &args.config {
            Some(path) => EditorConfig::from_json(&read_string(path)?)?,
            None => EditorConfig::default(),
        };
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.archive_name));

        let mut fonts = FontBook::from_bytes(read(&args.font)?)?;
        for (family, path) in &args.font_map {
            fonts.insert_bytes(family, read(path)?)?;
        }
        let mut rasterizer = ImageRasterizer::from_template_bytes(&read(&args.template)?, fonts)?;
        let size = rasterizer.template_size();

        let mut editor = Editor::new(config, size.width, size.height)?;
        editor.upload_template(size.width, size.height)?;
        editor.upload_data(&read(&args.data)?)?;
        let layout = Layout::from_json(&read_string(&args.layout)?)?;
        let placed = editor.session_mut().apply_layout(&layout)?;
        editor.refresh_extents(|text, style| rasterizer.measure(text, style));
        tracing::info!(fields = placed.len(), "layout applied");

        let options = ExportOptions {
            reject_duplicate_names: args.reject_duplicates,
            cancel: None,
        };
        let archive = pollster::block_on(editor.export(
            &args.pattern,
            &mut rasterizer,
            &options,
            |progress| {
                tracing::info!(
                    done = progress.done,
                    total = progress.total,
                    file = progress.filename,
                    "rendered"
                );
            },
        ))?;

        fs::write(&output, &archive)?;
        eprintln!("Written: {} ({} bytes)", output.display(), archive.len());
        Ok(())
    }

    /// 2 for bad or missing input, 1 for failures inside the pipeline.
    fn exit_code(e: &CertgenError) -> u8 {
        if e.is_user_input() {
            2
        } else {
            1
        }
    }

    pub fn main() -> ExitCode {
        let cli = Cli::parse();
        init_logging(cli.verbose);

        let result = match &cli.cmd {
            Command::Inspect(args) => cmd_inspect(args),
            Command::Names(args) => cmd_names(args),
            Command::Render(args) => cmd_render(args),
        };
        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::from(exit_code(&e))
            }
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
