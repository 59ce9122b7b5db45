//! Document import/export and image loading for the editor.

use super::Editor;
use crate::document::{LoadReport, read_document, write_document};
use crate::error::{DocumentError, EditorError, EditorResult, LoadError};
use crate::export::{Blob, Rasterizer};
use crate::loader::{ImageLoader, LoadTarget, LoadTicket, data_uri};
use crate::shapes::{DecodedImage, ImageFormat, Node, NodeId, NodeKind, TextId};
use crate::tools::ToolMode;
use std::collections::HashSet;

/// What a pending file pick is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Document,
    Image,
}

/// A file handed over by the host's file picker.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Guess the import kind from the content.
    fn sniff(&self) -> ImportKind {
        if ImageFormat::from_magic_bytes(&self.bytes).is_some() {
            ImportKind::Image
        } else {
            ImportKind::Document
        }
    }
}

/// Result of handling a picked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file replaced the scene.
    Document(LoadReport),
    /// The image is waiting for its pixels.
    ImageQueued(LoadTicket),
}

/// Result of completing a load ticket.
#[derive(Debug)]
pub enum LoadOutcome {
    Rehydrated(NodeId),
    Inserted(NodeId),
    /// The scene was replaced after the load started.
    Stale,
    /// The image node was removed while loading.
    NodeMissing(NodeId),
    Failed(LoadError),
}

impl Editor {
    /// Serialize the scene as a stage document.
    pub fn to_document(&self) -> Result<String, DocumentError> {
        write_document(&self.scene)
    }

    /// Replace the scene with a stage document.
    ///
    /// On error the current scene is left untouched. Image nodes come back as
    /// placeholders and are queued for loading.
    pub fn from_document(&mut self, json: &str) -> EditorResult<LoadReport> {
        let (scene, mut report) = read_document(json, (self.config.stage_width, self.config.stage_height))?;
        self.scene = scene;
        report.reassigned_text_ids = self.reconcile_text_ids();
        self.reset_scene_state();
        let mode = self.tools.mode();
        self.tools.enter(mode);

        for id in self.scene.nodes_of_kind(NodeKind::Image) {
            let source = match self.scene.get(id).and_then(Node::as_image) {
                Some(image) => image.source.clone(),
                None => continue,
            };
            self.queue_load(source, LoadTarget::Rehydrate(id));
        }

        log::info!(
            "Loaded document: {} nodes, {} images pending, {} skipped",
            report.loaded,
            report.images,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Give every text node a distinct id and keep the generator ahead of them.
    fn reconcile_text_ids(&mut self) -> usize {
        let mut seen: HashSet<TextId> = HashSet::new();
        let mut replace = Vec::new();
        for id in self.scene.nodes_of_kind(NodeKind::Text) {
            let Some(text) = self.scene.get(id).and_then(Node::as_text) else {
                continue;
            };
            if self.texts.ids().observe(text.text_id) && seen.insert(text.text_id) {
                continue;
            }
            replace.push(id);
        }

        for &id in &replace {
            let fresh = loop {
                let candidate = self.texts.ids().mint();
                if seen.insert(candidate) {
                    break candidate;
                }
            };
            if let Some(text) = self.scene.get_mut(id).and_then(Node::as_text_mut) {
                log::debug!("Text id {} reassigned to {fresh}", text.text_id);
                text.text_id = fresh;
            }
        }
        replace.len()
    }

    /// Ask the host to pick a document to load.
    pub fn load_document(&mut self) {
        self.begin_import(ImportKind::Document);
    }

    /// Ask the host to pick an image to insert.
    pub fn add_image(&mut self) {
        self.begin_import(ImportKind::Image);
    }

    fn begin_import(&mut self, kind: ImportKind) {
        self.tools.enter(ToolMode::Loading);
        self.import = Some(kind);
    }

    /// The host's picker closed without a file.
    pub fn cancel_import(&mut self) {
        self.import = None;
        self.tools.finish();
    }

    /// Handle a picked file. Returns to idle whether or not it succeeds.
    pub fn handle_file(&mut self, file: FileInput) -> EditorResult<FileOutcome> {
        let kind = self.import.take().unwrap_or_else(|| file.sniff());
        let result = self.import_file(kind, &file);
        if self.tools.mode().is_loading() {
            self.tools.finish();
        }
        if let Err(e) = &result {
            log::warn!("Failed to import {}: {e}", file.name);
        }
        result
    }

    fn import_file(&mut self, kind: ImportKind, file: &FileInput) -> EditorResult<FileOutcome> {
        match kind {
            ImportKind::Document => {
                let json = std::str::from_utf8(&file.bytes)
                    .map_err(|e| DocumentError::Malformed(format!("{} is not UTF-8: {e}", file.name)))?;
                Ok(FileOutcome::Document(self.from_document(json)?))
            }
            ImportKind::Image => {
                let (source, format) = data_uri(&file.bytes)?;
                log::info!("Queued {} image {}", format.mime_type(), file.name);
                Ok(FileOutcome::ImageQueued(self.queue_load(source, LoadTarget::Insert)))
            }
        }
    }

    fn queue_load(&mut self, source: String, target: LoadTarget) -> LoadTicket {
        let ticket = LoadTicket {
            id: self.next_ticket,
            epoch: self.epoch,
            source,
            target,
        };
        self.next_ticket += 1;
        self.pending_loads.push(ticket.clone());
        ticket
    }

    /// Loads waiting to be started, oldest first.
    pub fn pending_loads(&self) -> &[LoadTicket] {
        &self.pending_loads
    }

    /// Hand the waiting loads to the host.
    pub fn take_pending_loads(&mut self) -> Vec<LoadTicket> {
        std::mem::take(&mut self.pending_loads)
    }

    /// Apply the result of a load started from `ticket`.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<DecodedImage, LoadError>) -> LoadOutcome {
        self.pending_loads.retain(|t| t.id != ticket.id);
        if ticket.epoch != self.epoch {
            log::debug!("Dropping load {} from epoch {}", ticket.id, ticket.epoch);
            return LoadOutcome::Stale;
        }
        let pixels = match result {
            Ok(pixels) => pixels,
            Err(e) => {
                log::warn!("Image load {} failed: {e}", ticket.id);
                return LoadOutcome::Failed(e);
            }
        };
        match ticket.target {
            LoadTarget::Rehydrate(id) => match self.scene.get_mut(id).and_then(Node::as_image_mut) {
                Some(image) => {
                    image.set_pixels(pixels);
                    self.request_redraw();
                    LoadOutcome::Rehydrated(id)
                }
                None => LoadOutcome::NodeMissing(id),
            },
            LoadTarget::Insert => {
                let mut image = self.shapes.image(ticket.source);
                image.set_pixels(pixels);
                LoadOutcome::Inserted(self.insert(Node::Image(image)))
            }
        }
    }

    /// Run every pending load through `loader` until none are left.
    pub async fn settle_loads(&mut self, loader: &dyn ImageLoader) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let tickets = self.take_pending_loads();
            if tickets.is_empty() {
                break;
            }
            for ticket in tickets {
                let result = loader.load(&ticket.source).await;
                outcomes.push(self.complete_load(ticket, result));
            }
        }
        outcomes
    }

    /// The scene as a `whiteboard.json` download.
    pub fn export_document(&self) -> Result<Blob, EditorError> {
        self.export.export_document(&self.scene)
    }

    /// The scene as a `whiteboard.png` download.
    pub fn export_raster(&self, rasterizer: &dyn Rasterizer) -> Result<Blob, EditorError> {
        self.export.export_raster(&self.scene, rasterizer)
    }
}
