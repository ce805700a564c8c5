// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Shared fixtures: in-memory PDFs and sessions rooted in a temp directory

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_chat::storage::CleanupPolicy;
use pdf_chat::{DistanceMetric, HashEmbedder, Session, SessionConfig};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const BIOLOGY_PAGE: &str = "Mitochondria produce ATP through cellular respiration. \
    The inner membrane holds the electron transport chain that drives ATP synthase.";
pub const HISTORY_PAGE: &str = "The Roman Republic was governed by two consuls elected \
    every year. The senate advised magistrates and controlled public finances.";
pub const GEOLOGY_PAGE: &str = "Igneous rocks form when magma cools. Basalt and granite \
    are common examples found in volcanic regions and continental crust.";

/// Build a PDF with one text-showing operation per page; empty strings give blank pages
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = Vec::new();
        if !text.is_empty() {
            operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![50.into(), 800.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ];
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn study_notes_pdf() -> Vec<u8> {
    pdf_with_pages(&[BIOLOGY_PAGE, HISTORY_PAGE, GEOLOGY_PAGE])
}

pub fn session_config(temp: &TempDir) -> SessionConfig {
    SessionConfig {
        db_base: temp.path().join("vector_db"),
        cleanup: CleanupPolicy::immediate(),
        metric: DistanceMetric::L2,
    }
}

pub fn hash_session(temp: &TempDir) -> Session {
    Session::new(Arc::new(HashEmbedder::new(128).unwrap()), session_config(temp))
}

/// Names of the entries directly under `dir`
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
