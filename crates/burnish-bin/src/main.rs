//! Burnish entrypoint: load a file, run it through the highlighting
//! pipeline, and emit styled rows as ANSI text or an SVG document.
//!
//! Everything the core crates treat as an external collaborator lives
//! here: the regex-based demo grammar engine, theme-file parsing, the
//! drawing surfaces, and configuration.

use anyhow::{Context, Result};
use clap::Parser;
use core_config::{Config, LanguageConfig};
use core_render::{
    CellMetrics, FontMetrics, FontMetricsProvider, Point, RenderingContext, Row, paint_row,
};
use core_state::Document;
use core_syntax::{GrammarRegistration, GrammarRegistry, LanguageRegistration};
use core_theme::FontStyle;
use crossterm::style::{
    Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use crossterm::queue;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod demo_grammar;
mod svg;
mod theme_json;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "burnish", version, about = "Syntax-highlighting pipeline demo")]
struct Args {
    /// File to highlight (UTF-8 text).
    pub path: PathBuf,
    /// JSON theme rule list (overrides the config file's theme).
    #[arg(long = "theme")]
    pub theme: Option<PathBuf>,
    /// Write an SVG rendering here instead of printing ANSI.
    #[arg(long = "svg")]
    pub svg: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `burnish.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Directory for the log file.
    #[arg(long = "log-dir", default_value = ".")]
    pub log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(&args.log_dir);
    run(args)
}

fn configure_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(log_dir, "burnish.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global subscriber already installed; drop guard so the writer
        // shuts down.
        Err(_err) => None,
    }
}

fn run(args: Args) -> Result<()> {
    let config = core_config::load_from(args.config.clone())?;
    let registry = build_registry(&config.file.languages);
    let theme = select_theme(args.theme.as_deref(), &config);
    info!(target: "runtime", theme = %theme.name, file = %args.path.display(), "startup");

    let fonts = Arc::new(DemoMetrics {
        inner: if args.svg.is_some() {
            CellMetrics::scaled(config.file.render.cell_px)
        } else {
            CellMetrics::default()
        },
        tab_cells: f32::from(config.effective_tab_width),
    });
    let ctx = RenderingContext::new(theme, fonts);
    let surface = ctx.background;

    let file = std::fs::File::open(&args.path)
        .with_context(|| format!("opening {}", args.path.display()))?;
    let mut doc = Document::open(file, &args.path, &registry, ctx)?;
    let line_count = doc.store().line_count();
    let rows = doc.rows(0..line_count)?;

    match &args.svg {
        Some(out) => {
            let markup = render_svg(&rows, surface);
            std::fs::write(out, markup)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(target: "io", file = %out.display(), rows = rows.len(), "svg_written");
        }
        None => print_ansi(&rows)?,
    }
    doc.teardown();
    Ok(())
}

fn build_registry(extra_languages: &[LanguageConfig]) -> GrammarRegistry {
    let mut registry = GrammarRegistry::new();
    let grammar = Arc::new(demo_grammar::CLikeGrammar::new());
    registry.register_grammar(GrammarRegistration {
        language: "c".into(),
        scope_name: "source.c".into(),
        grammar,
    });
    registry.register_language(LanguageRegistration {
        id: "c".into(),
        extensions: vec![".c".into(), ".h".into()],
    });
    // Config-supplied registrations are merged over the built-ins; ids
    // without a registered grammar degrade to plain text at open time.
    for language in extra_languages {
        registry.register_language(LanguageRegistration {
            id: language.id.clone(),
            extensions: language.extensions.clone(),
        });
    }
    registry
}

fn select_theme(cli_theme: Option<&Path>, config: &Config) -> core_theme::Theme {
    let configured = cli_theme.or(config.file.theme.file.as_deref());
    match configured {
        Some(path) => match theme_json::load(path) {
            Ok(theme) => theme,
            Err(err) => {
                // A broken theme must not block the document: degrade to
                // the built-in default.
                warn!(target: "runtime", theme = %path.display(), %err, "theme_fallback");
                theme_json::default_theme()
            }
        },
        None => theme_json::default_theme(),
    }
}

/// Cell metrics with configurable tab advance, demonstrating the metrics
/// seam: the pipeline itself never special-cases tabs.
struct DemoMetrics {
    inner: CellMetrics,
    tab_cells: f32,
}

impl FontMetricsProvider for DemoMetrics {
    fn metrics(&self, style: FontStyle) -> FontMetrics {
        self.inner.metrics(style)
    }

    fn advance(&self, cluster: &str, style: FontStyle) -> Option<f32> {
        if cluster == "\t" {
            return Some(self.tab_cells * self.inner.cell);
        }
        self.inner.advance(cluster, style)
    }

    fn replacement_advance(&self, style: FontStyle) -> f32 {
        self.inner.replacement_advance(style)
    }
}

fn term_color(color: core_theme::Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

fn print_ansi(rows: &[Row]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in rows {
        for run in &row.runs {
            queue!(out, SetForegroundColor(term_color(run.style.foreground)))?;
            if let Some(bg) = run.style.background {
                queue!(out, SetBackgroundColor(term_color(bg)))?;
            }
            if run.style.bold() {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            if run.style.italic() {
                queue!(out, SetAttribute(Attribute::Italic))?;
            }
            if run.style.underline() {
                queue!(out, SetAttribute(Attribute::Underlined))?;
            }
            if run.style.strikethrough() {
                queue!(out, SetAttribute(Attribute::CrossedOut))?;
            }
            queue!(out, Print(run.text.as_str()))?;
            queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        }
        queue!(out, Print("\n"))?;
    }
    out.flush()?;
    Ok(())
}

fn render_svg(rows: &[Row], surface: core_theme::Color) -> String {
    const PAD: f32 = 4.0;
    let width = rows.iter().map(|r| r.width).fold(0.0f32, f32::max) + PAD * 2.0;
    let height: f32 = rows.iter().map(Row::height).sum::<f32>() + PAD * 2.0;
    let font_px = rows
        .first()
        .map(|r| r.height() * 0.9)
        .unwrap_or(12.0);
    let mut canvas = svg::SvgCanvas::new(width, height, font_px, surface);
    let mut y = PAD;
    for row in rows {
        paint_row(row, Point::new(PAD, y), &mut canvas);
        y += row.height();
    }
    canvas.finish()
}
