//! Save/load of replay documents
//!
//! Features:
//! - Pretty JSON on disk
//! - Write to a temp file, then rename over the target
//! - Documents are validated before anything is built from them

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::replay::ReplayDocument;

/// Why a replay could not be saved or loaded
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("replay document is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("replay has no recorded pieces")]
    EmptyPieceSequence,
    #[error("replay has no recorded moves")]
    EmptyMoves,
}

/// Write `doc` to `path`
pub fn save_replay(path: impl AsRef<Path>, doc: &ReplayDocument) -> Result<(), ReplayError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = doc.to_json()?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    log::info!(
        "Replay saved to {} ({} pieces, {} moves, score {})",
        path.display(),
        doc.piece_sequence.len(),
        doc.moves.len(),
        doc.final_score
    );
    Ok(())
}

/// Read and validate a document from `path`
pub fn load_replay(path: impl AsRef<Path>) -> Result<ReplayDocument, ReplayError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let doc = ReplayDocument::from_json(&json)?;
    log::info!(
        "Loaded replay from {} ({} pieces, {} moves)",
        path.display(),
        doc.piece_sequence.len(),
        doc.moves.len()
    );
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{Input, PieceRecord, RecordedInput};
    use crate::sim::ShapeKind;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("blockfall-replay-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_save_then_load() {
        let doc = ReplayDocument {
            piece_sequence: vec![PieceRecord::new(
                ShapeKind::T,
                ShapeKind::T.canonical_shape(),
            )],
            moves: vec![RecordedInput {
                time: 0.5,
                input: Input::Move { dx: 1, dy: 0 },
            }],
            final_score: 300,
        };
        let path = scratch_path("save_then_load.json");

        save_replay(&path, &doc).unwrap();
        let loaded = load_replay(&path).unwrap();
        assert_eq!(loaded, doc);
        assert!(!path.with_extension("json.tmp").exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_replay(scratch_path("does_not_exist.json"));
        assert!(matches!(result, Err(ReplayError::Io(_))));
    }

    #[test]
    fn test_invalid_document_is_not_loaded() {
        let path = scratch_path("empty_moves.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"piece_sequence": [{"shape": [[1]], "key": "O"}], "moves": []}"#,
        )
        .unwrap();

        assert!(matches!(load_replay(&path), Err(ReplayError::EmptyMoves)));
        let _ = fs::remove_file(&path);
    }
}
