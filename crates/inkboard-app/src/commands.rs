//! Command implementations.

use crate::cli::{Cli, Command};
use inkboard_core::shapes::NodeKind;
use inkboard_core::storage::{DownloadSink, FileSink, StorageError};
use inkboard_core::{
    DataUriLoader, Editor, EditorConfig, EditorError, FileInput, FileOutcome, LoadOutcome, LoadReport,
};
use inkboard_render::{RendererError, SkiaRasterizer};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0} is not a document")]
    NotADocument(String),
}

fn read(path: &Path) -> Result<Vec<u8>, AppError> {
    fs::read(path).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    fs::write(path, bytes).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn file_input(path: &Path) -> Result<FileInput, AppError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(FileInput::new(name, read(path)?))
}

/// Wait for every pending image and log the ones that failed.
fn settle(editor: &mut Editor) {
    for outcome in pollster::block_on(editor.settle_loads(&DataUriLoader::new())) {
        if let LoadOutcome::Failed(e) = outcome {
            log::warn!("Image left unloaded: {e}");
        }
    }
}

fn open_document(editor: &mut Editor, path: &Path) -> Result<LoadReport, AppError> {
    editor.load_document();
    let FileOutcome::Document(report) = editor.handle_file(file_input(path)?)? else {
        return Err(AppError::NotADocument(path.display().to_string()));
    };
    for skipped in &report.skipped {
        log::warn!("{}: skipped {skipped}", path.display());
    }
    settle(editor);
    Ok(report)
}

fn rasterizer(font: Option<&Path>) -> Result<SkiaRasterizer, AppError> {
    let rasterizer = SkiaRasterizer::new();
    match font {
        Some(path) => Ok(rasterizer.with_font(read(path)?)?),
        None => Ok(rasterizer),
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig, AppError> {
    match path {
        Some(path) => Ok(EditorConfig::load(path).map_err(EditorError::from)?),
        None => Ok(EditorConfig::default()),
    }
}

/// Run a parsed command, returning what to print.
pub fn run(cli: Cli) -> Result<String, AppError> {
    let mut editor = Editor::new(load_config(cli.config.as_deref())?);

    match cli.command {
        Command::Render {
            document,
            output,
            font,
        } => {
            open_document(&mut editor, &document)?;
            let blob = editor.export_raster(&rasterizer(font.as_deref())?)?;
            write(&output, &blob.bytes)?;
            Ok(format!("Wrote {}", output.display()))
        }
        Command::Import { image, output } => {
            editor.add_image();
            editor.handle_file(file_input(&image)?)?;
            settle(&mut editor);
            write(&output, editor.to_document().map_err(EditorError::from)?.as_bytes())?;
            Ok(format!("Wrote {}", output.display()))
        }
        Command::Summary { document } => {
            let report = open_document(&mut editor, &document)?;
            Ok(summary(&editor, &report))
        }
        Command::Export {
            document,
            dir,
            font,
        } => {
            open_document(&mut editor, &document)?;
            let sink = match dir {
                Some(dir) => FileSink::new(dir)?,
                None => FileSink::default_location()?,
            };
            let blobs = [
                editor.export_document()?,
                editor.export_raster(&rasterizer(font.as_deref())?)?,
            ];
            let mut saved = Vec::new();
            for blob in &blobs {
                saved.push(pollster::block_on(sink.deliver(blob))?);
            }
            Ok(format!("Saved {} to {}", saved.join(", "), sink.base_path().display()))
        }
    }
}

fn summary(editor: &Editor, report: &LoadReport) -> String {
    let scene = editor.scene();
    let mut lines = vec![format!("Stage {}x{}, {} nodes", scene.width, scene.height, scene.len())];
    for kind in [
        NodeKind::Stroke,
        NodeKind::Circle,
        NodeKind::Rect,
        NodeKind::Text,
        NodeKind::Image,
    ] {
        let count = scene.nodes_of_kind(kind).len();
        if count > 0 {
            lines.push(format!("  {}: {count}", kind.class_name()));
        }
    }
    if !report.is_clean() {
        lines.push(format!("  skipped: {}", report.skipped.len()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn cli(command: Command) -> Cli {
        Cli {
            config: None,
            command,
        }
    }

    #[test]
    fn test_import_then_render_and_summary() {
        let dir = tempdir().unwrap();
        let photo = dir.path().join("photo.png");
        let document = dir.path().join("board.json");
        let raster = dir.path().join("board.png");
        fs::write(&photo, png_bytes(6, 4)).unwrap();

        run(cli(Command::Import {
            image: photo,
            output: document.clone(),
        }))
        .unwrap();
        assert!(fs::read_to_string(&document).unwrap().contains("\"className\":\"Image\""));

        run(cli(Command::Render {
            document: document.clone(),
            output: raster.clone(),
            font: None,
        }))
        .unwrap();
        let decoded = image::load_from_memory(&fs::read(&raster).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 800));

        let text = run(cli(Command::Summary { document })).unwrap();
        assert!(text.starts_with("Stage 1024x800, 1 nodes"));
        assert!(text.contains("Image: 1"));
    }

    #[test]
    fn test_export_into_directory() {
        let dir = tempdir().unwrap();
        let document = dir.path().join("in.json");
        fs::write(&document, r#"{"attrs":{"width":64,"height":48},"className":"Stage","children":[]}"#).unwrap();
        let out = dir.path().join("out");

        let message = run(cli(Command::Export {
            document,
            dir: Some(out.clone()),
            font: None,
        }))
        .unwrap();
        assert!(message.contains("whiteboard.json, whiteboard.png"));
        assert!(out.join("whiteboard.json").is_file());
        assert!(out.join("whiteboard.png").is_file());
    }

    #[test]
    fn test_config_changes_stage_size() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("ink.json");
        fs::write(&config, r#"{"stageWidth": 300, "stageHeight": 200}"#).unwrap();
        let photo = dir.path().join("a.png");
        fs::write(&photo, png_bytes(2, 2)).unwrap();
        let document = dir.path().join("a.json");

        run(Cli {
            config: Some(config),
            command: Command::Import {
                image: photo,
                output: document.clone(),
            },
        })
        .unwrap();
        let text = run(cli(Command::Summary { document })).unwrap();
        assert!(text.starts_with("Stage 300x200"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = run(cli(Command::Summary {
            document: PathBuf::from("/nonexistent/board.json"),
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
        assert!(err.to_string().starts_with("/nonexistent/board.json"));
    }
}
