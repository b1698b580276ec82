//! Artboard command-line host.
//!
//! Renders template files, publishes them into a local store directory and
//! replays published templates in generator mode.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use artboard_core::{
    load_generator, EditorSession, ElementId, GeneratorLoad, GeneratorView, MemoryTemplateStore,
    Template, TemplateSnapshot,
};
use artboard_renderer::{
    render_template, ExportConfig, ExportFormat, ImageSlot, ImageSlots, LocalImageSource,
    RenderContext, RenderMode, TemplateExporter, EXPORT_PIXEL_RATIO,
};
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the `artboard` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "artboard")]
#[command(about = "Render, publish and generate from Artboard templates")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding published templates
    #[arg(long, env = "ARTBOARD_DATA_DIR", default_value = "artboard-data")]
    pub data_dir: PathBuf,

    /// Device pixels per artboard unit for raster output
    #[arg(long, env = "ARTBOARD_PIXEL_RATIO", default_value_t = EXPORT_PIXEL_RATIO)]
    pub pixel_ratio: f32,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a template file to an image
    Render {
        /// Template JSON file
        template: PathBuf,
        /// Surface to render for
        #[arg(long, value_enum, default_value_t = Mode::Editor)]
        mode: Mode,
        /// Photo for placeholders (path or data URI), generator mode only
        #[arg(long)]
        photo: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Publish a template file and print its slug
    Publish {
        /// Template JSON file
        template: PathBuf,
    },
    /// Print a published template as template JSON
    Fetch {
        /// Published slug
        slug: String,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Fill a published template and export the result
    Generate {
        /// Published slug
        slug: String,
        /// Photo for placeholders (path or data URI)
        #[arg(long)]
        photo: Option<String>,
        /// Replace a text element's content, as `<element-id>=<text>`
        #[arg(long = "text", value_parser = parse_text_override)]
        texts: Vec<(String, String)>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
    },
}

/// Render surface selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Editor rendering with placeholder affordances.
    Editor,
    /// Generator rendering with the supplied photo.
    Generator,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Editor => Self::Editor,
            Mode::Generator => Self::Generator,
        }
    }
}

/// Output format selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// SVG document.
    Svg,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => Self::Png,
            OutputFormat::Jpeg => Self::Jpeg,
            OutputFormat::Svg => Self::Svg,
        }
    }
}

fn parse_text_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(id, text)| (id.to_string(), text.to_string()))
        .ok_or_else(|| format!("expected <element-id>=<text>, got {raw:?}"))
}

/// Run one subcommand, returning what should be printed to stdout.
///
/// # Errors
///
/// Returns an error if a file cannot be read or written, the template is
/// malformed, or the store rejects the request.
pub async fn run(args: CliArgs) -> anyhow::Result<String> {
    let exporter = TemplateExporter::new(ExportConfig {
        pixel_ratio: args.pixel_ratio,
        ..ExportConfig::default()
    });

    match args.command {
        Command::Render {
            template,
            mode,
            photo,
            format,
            out,
        } => {
            let images = image_source_for(&template);
            let template = read_template(&template).await?;
            let photo = match mode {
                Mode::Editor => None,
                Mode::Generator => photo,
            };
            let slots = load_images(&images, &template, photo.as_deref()).await;
            export(&exporter, &template, &slots, mode.into(), format, &out).await
        }
        Command::Publish { template } => {
            let mut session = EditorSession::new(read_template(&template).await?);
            let store = MemoryTemplateStore::with_data_dir(&args.data_dir)?;
            let receipt = session.publish(&store).await?;
            tracing::info!("Template {} published", receipt.id);
            Ok(receipt.slug)
        }
        Command::Fetch { slug, out } => {
            let view = open_published(&args.data_dir, &slug).await?;
            let json = TemplateSnapshot::from(view.template()).to_json()?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    Ok(format!("wrote {}", path.display()))
                }
                None => Ok(json),
            }
        }
        Command::Generate {
            slug,
            photo,
            texts,
            format,
            out,
        } => {
            let mut view = open_published(&args.data_dir, &slug).await?;
            for (id, text) in texts {
                let id = ElementId::parse(&id).with_context(|| format!("invalid element id {id}"))?;
                view.set_text(id, text)?;
            }
            view.set_photo(photo);
            let slots =
                load_images(&LocalImageSource::new(), view.template(), view.photo()).await;
            view.set_photo_decoded(slots.get(ImageSlot::Photo).is_some());
            if !view.can_download() {
                match view.photo() {
                    Some(photo) => bail!("photo {photo} could not be decoded"),
                    None => bail!("template {slug} has photo placeholders; pass --photo"),
                }
            }
            export(
                &exporter,
                view.template(),
                &slots,
                RenderMode::Generator,
                format,
                &out,
            )
            .await
        }
    }
}

fn image_source_for(template_path: &Path) -> LocalImageSource {
    match template_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => LocalImageSource::with_root(dir),
        _ => LocalImageSource::new(),
    }
}

async fn read_template(path: &Path) -> anyhow::Result<Template> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let template = TemplateSnapshot::from_json(&json)?.into_template()?;
    Ok(template)
}

async fn open_published(data_dir: &Path, slug: &str) -> anyhow::Result<GeneratorView> {
    let store = MemoryTemplateStore::with_data_dir(data_dir)?;
    match load_generator(&store, slug).await? {
        GeneratorLoad::Ready(view) => Ok(view),
        GeneratorLoad::NotFound { slug } => bail!("no template published as {slug}"),
    }
}

async fn load_images(
    images: &LocalImageSource,
    template: &Template,
    photo: Option<&str>,
) -> ImageSlots {
    let mut slots = ImageSlots::new();
    slots.load_template(images, template).await;
    if let Some(photo) = photo {
        slots.load(images, ImageSlot::Photo, photo).await;
        if slots.get(ImageSlot::Photo).is_none() {
            tracing::warn!("Photo {photo} could not be decoded; placeholders keep their fill");
        }
    }
    slots
}

async fn export(
    exporter: &TemplateExporter,
    template: &Template,
    slots: &ImageSlots,
    mode: RenderMode,
    format: OutputFormat,
    out: &Path,
) -> anyhow::Result<String> {
    let ctx = RenderContext {
        mode,
        slots: Some(slots),
    };
    let tree = render_template(template, &ctx);
    let bytes = exporter.export(&tree, format.into())?;
    tokio::fs::write(out, &bytes)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!("Exported {} bytes to {}", bytes.len(), out.display());
    Ok(format!("wrote {}", out.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use artboard_core::{Element, ElementKind};

    /// 1x1 red PNG.
    const PNG_1X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn args(dir: &Path, rest: &[&str]) -> CliArgs {
        let data_dir = dir.join("data");
        let mut argv = vec![
            "artboard".to_string(),
            "--data-dir".to_string(),
            data_dir.display().to_string(),
        ];
        argv.extend(rest.iter().map(ToString::to_string));
        CliArgs::try_parse_from(argv).expect("parse")
    }

    fn write_template(dir: &Path) -> (PathBuf, ElementId) {
        let mut template = Template::new("Card", 300, 200);
        template
            .add_element(Element::with_kind(ElementKind::Circle).with_placeholder(true))
            .expect("circle");
        let text = template
            .add_element(Element::with_kind(ElementKind::Text))
            .expect("text");
        let path = dir.join("card.json");
        let json = TemplateSnapshot::from(&template).to_json().expect("json");
        std::fs::write(&path, json).expect("write template");
        (path, text)
    }

    #[test]
    fn test_args_defaults() {
        let args = CliArgs::try_parse_from(["artboard", "publish", "t.json"]).expect("parse");
        assert!((args.pixel_ratio - 2.0).abs() < f32::EPSILON);
        assert!(matches!(args.command, Command::Publish { .. }));
    }

    #[test]
    fn test_text_override_parsing() {
        assert_eq!(
            parse_text_override("abc=Hello = world").expect("parse"),
            ("abc".to_string(), "Hello = world".to_string())
        );
        assert!(parse_text_override("missing").is_err());
    }

    #[tokio::test]
    async fn test_publish_fetch_generate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (template, text_id) = write_template(dir.path());

        let slug = run(args(dir.path(), &["publish", &template.display().to_string()]))
            .await
            .expect("publish");
        assert!(artboard_core::schema::is_valid_slug(&slug));

        let json = run(args(dir.path(), &["fetch", &slug])).await.expect("fetch");
        let snapshot = TemplateSnapshot::from_json(&json).expect("snapshot");
        assert_eq!(snapshot.name, "Card");

        let out = dir.path().join("out.svg");
        let missing_photo = run(args(
            dir.path(),
            &["generate", &slug, "--format", "svg", "-o", &out.display().to_string()],
        ))
        .await;
        assert!(missing_photo.is_err());

        let unreadable_photo = run(args(
            dir.path(),
            &[
                "generate",
                &slug,
                "--photo",
                "/no/such/photo.png",
                "--format",
                "svg",
                "-o",
                &out.display().to_string(),
            ],
        ))
        .await;
        assert!(unreadable_photo.is_err());
        assert!(!out.exists());

        let text_arg = format!("{text_id}=Hi there");
        run(args(
            dir.path(),
            &[
                "generate",
                &slug,
                "--photo",
                PNG_1X1,
                "--text",
                &text_arg,
                "--format",
                "svg",
                "-o",
                &out.display().to_string(),
            ],
        ))
        .await
        .expect("generate");
        let svg = std::fs::read_to_string(&out).expect("read svg");
        assert!(svg.contains("Hi there"));
        assert!(svg.contains("clip-path"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_slug_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run(args(dir.path(), &["fetch", "zzzzzzzz"])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_render_editor_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (template, _) = write_template(dir.path());
        let out = dir.path().join("card.png");
        run(args(
            dir.path(),
            &[
                "--pixel-ratio",
                "1",
                "render",
                &template.display().to_string(),
                "-o",
                &out.display().to_string(),
            ],
        ))
        .await
        .expect("render");
        let png = std::fs::read(&out).expect("read png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }
}
