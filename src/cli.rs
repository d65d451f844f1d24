use crate::catalog::Catalog;
use crate::config::{load_config, Config};
use crate::dump::write_geometry_dump;
use crate::ir::Diagram;
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::{render_svg, write_output_svg};
use crate::theme::Theme;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "archsvg", version, about = "Architecture diagram renderer (declarative JSON catalog to SVG)")]
pub struct Args {
    /// Catalog file mapping project ids to diagram descriptions
    #[arg(short = 'i', long = "catalog")]
    pub catalog: PathBuf,

    /// Project id to render
    #[arg(short = 'p', long = "project", required_unless_present = "all")]
    pub project: Option<String>,

    /// Render every project in the catalog into the output directory
    #[arg(long = "all", conflicts_with = "project")]
    pub all: bool,

    /// Output file (svg/png), or directory with --all. Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme name, theme variables, geometry overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Theme name (light|dark); takes precedence over the config file
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    /// Write resolved geometry (anchors, paths, overflow) as JSON
    #[arg(long = "dump-geometry", conflicts_with = "all")]
    pub dump_geometry: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(name) = args.theme.as_deref() {
        config.theme = Theme::by_name(name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme: {name} (expected light or dark)"))?;
    }

    let catalog = Catalog::load(&args.catalog)?;

    if args.all {
        return render_all(&catalog, &config, &args);
    }

    let project = args
        .project
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("a project id is required unless --all is given"))?;
    let diagram = catalog.get(project)?;

    if let Some(dump_path) = args.dump_geometry.as_deref() {
        write_geometry_dump(dump_path, diagram, &config.geometry)?;
    }

    let svg = render_svg(diagram, &config.theme, &config.geometry);
    write_diagram(&svg, args.output.as_deref(), args.output_format, &config)
}

fn render_all(catalog: &Catalog, config: &Config, args: &Args) -> Result<()> {
    if catalog.is_empty() {
        return Err(anyhow::anyhow!("catalog has no projects"));
    }
    let dir = args
        .output
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--all requires an output directory"))?;
    std::fs::create_dir_all(dir)?;

    for project in catalog.project_ids() {
        let diagram = catalog.get(project)?;
        let svg = render_svg(diagram, &config.theme, &config.geometry);
        let path = project_output_path(dir, project, args.output_format);
        write_diagram(&svg, Some(&path), args.output_format, config)?;
    }
    Ok(())
}

fn write_diagram(
    svg: &str,
    output: Option<&Path>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    match format {
        OutputFormat::Svg => write_output_svg(svg, output),
        OutputFormat::Png => {
            let output =
                output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            write_png(svg, output, config)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    write_output_png(svg, output, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!(
        "png output requires building with the `png` feature"
    ))
}

fn project_output_path(dir: &Path, project: &str, format: OutputFormat) -> PathBuf {
    let ext = match format {
        OutputFormat::Svg => "svg",
        OutputFormat::Png => "png",
    };
    dir.join(format!("{project}.{ext}"))
}

pub fn render_project(catalog: &Catalog, project: &str, config: &Config) -> Result<String> {
    let diagram: &Diagram = catalog.get(project)?;
    Ok(render_svg(diagram, &config.theme, &config.geometry))
}
