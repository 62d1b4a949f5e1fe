use clap::Parser;
use color_print::cprintln;
use gblink::{check_overlaps, Error, Frame, LayoutFile};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Layout description
    #[clap(default_value = "layout.yaml")]
    input: PathBuf,

    /// Write a JSON dump of all sections (`stdout` to print it)
    #[clap(short, long)]
    json: Option<String>,

    /// Project base directory for `/` rooted includes
    #[clap(short, long)]
    base: Option<PathBuf>,

    /// Reject sections sharing bytes in the same region and bank
    #[clap(long)]
    strict: bool,

    /// Enable verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "gblink=debug" } else { "gblink=info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&args) {
        err.print_diag();
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let quiet = args.json.as_deref() == Some("stdout");
    let dir = args
        .input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let base = args.base.clone().unwrap_or_else(|| dir.clone());

    if !quiet {
        println!("1. Read Layout");
        println!("  < {}", args.input.display());
    }
    let mut layout = LayoutFile::load(&args.input)?.build(&dir, &base)?;

    if !quiet {
        println!("2. Resolve Offsets");
    }
    layout.resolve()?;
    if args.strict {
        check_overlaps(layout.sections())?;
    }
    if !quiet {
        for section in layout.sections() {
            cprintln!(
                "  <g>{}</> <dim>({})</>",
                section.summary(Frame::Physical),
                section.summary(Frame::Cpu)
            );
        }
    }

    if let Some(json) = &args.json {
        let text = serde_json::to_string_pretty(&layout.dump())?;
        if json == "stdout" {
            println!("{}", text);
        } else {
            println!("3. Write Dump");
            println!("  > {}", json);
            std::fs::write(json, text)?;
        }
    }
    Ok(())
}
