use clap::{Parser, Subcommand};
use limner::config::{self, CONFIG_FILE};
use limner::generator::{Generator, ShapeGenerator, ShapeOptions};
use limner::{Context, Format, Point, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "limner")]
#[command(about = "Load, draw on, and save images through interchangeable drivers")]
#[command(long_about = "\
Load, draw on, and save images through interchangeable drivers

Drivers are detected in order (raster, magick, pipeline); the first available
one is used unless --driver or the config file's [drivers] preferred names
another.

  raster     plain RGBA canvas, encodes png and jpeg
  magick     anti-aliased canvas, encodes png, jpeg and webp
  pipeline   immutable images, file sources only, thick lines composited

Formats are inferred from file extensions unless --format is given.

Run 'limner gen-config' to generate a documented limner.toml.")]
#[command(version)]
struct Cli {
    /// Driver to use instead of the current one
    #[arg(long, global = true)]
    driver: Option<String>,

    /// Config file
    #[arg(long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Log driver activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List detected drivers; the current one is marked with '*'
    Drivers,
    /// Print dimensions, format and driver of an image
    Info {
        path: PathBuf,
        /// Format to read as (default: from extension)
        #[arg(long)]
        format: Option<Format>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a blank image
    Blank {
        output: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Fill color (#rgb, #rgba, #rrggbb or #rrggbbaa)
        #[arg(long, default_value = "#ffffff")]
        color: String,
        /// Output format (default: from extension)
        #[arg(long)]
        format: Option<Format>,
    },
    /// Draw a straight line onto an image
    Line {
        input: PathBuf,
        output: PathBuf,
        /// Start point as X,Y
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: Point,
        /// End point as X,Y
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: Point,
        #[arg(long, default_value = "#000000")]
        color: String,
        #[arg(long, default_value_t = 1)]
        thickness: u32,
        /// Output format (default: from extension)
        #[arg(long)]
        format: Option<Format>,
    },
    /// Print a stock limner.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let driver = cli.driver.as_deref();

    match cli.command {
        Command::Drivers => {
            let ctx = load_context(&cli.config)?;
            output::print_driver_list(ctx.registry());
        }
        Command::Info { path, format, json } => {
            let ctx = load_context(&cli.config)?;
            let format = resolve_format(format, &path)?;
            let image = ctx.image(&path, format.name(), driver)?;
            let info = output::ImageInfo::new(&path, &image);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_image_info(&info);
            }
        }
        Command::Blank {
            output: dest,
            width,
            height,
            color,
            format,
        } => {
            let ctx = load_context(&cli.config)?;
            let format = resolve_format(format, &dest)?;
            let mut image = ctx.create_blank(width, height, format.name(), Some(&color), driver)?;
            let written = ctx.save(&mut image, format.name(), &dest)?;
            println!("{}", output::format_written(&dest, &image, written));
        }
        Command::Line {
            input,
            output: dest,
            from,
            to,
            color,
            thickness,
            format,
        } => {
            let ctx = load_context(&cli.config)?;
            let in_format = Format::from_extension(&input)?;
            let out_format = resolve_format(format, &dest)?;
            let mut image = ctx.image(&input, in_format.name(), driver)?;

            let options = ShapeOptions::line([from.x, from.y, to.x, to.y], &color, thickness);
            ShapeGenerator::new().generate(&mut image, &options)?;

            let written = ctx.save(&mut image, out_format.name(), &dest)?;
            println!("{}", output::format_written(&dest, &image, written));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_context(path: &Path) -> Result<Context, Box<dyn std::error::Error>> {
    let config = config::load_config(path)?;
    Ok(Context::from_config(&config)?)
}

/// Initialize logging; `RUST_LOG` still overrides the level.
fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn resolve_format(explicit: Option<Format>, path: &Path) -> Result<Format, limner::FormatError> {
    match explicit {
        Some(f) => Ok(f),
        None => Format::from_extension(path),
    }
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x = x.trim().parse::<i32>().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y = y.trim().parse::<i32>().map_err(|e| format!("bad y '{}': {}", y, e))?;
    Ok(Point::new(x, y))
}
