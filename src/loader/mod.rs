//! Mesh loading: format inference, byte fetching, and per-format parsers.
//!
//! One concrete parser per supported container format. The format is either
//! declared by the caller or inferred from the source's file-extension
//! suffix; there is no content sniffing and no silent fallback — a file that
//! fails to parse as its declared format is an error.

mod obj;
mod stl;
mod three_mf;

use crate::mesh::TriangleMesh;
use std::fmt;
use std::io::Read;

/// Supported mesh container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
    ThreeMf,
}

impl MeshFormat {
    /// Map a file extension (without dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            "3mf" => Some(Self::ThreeMf),
            _ => None,
        }
    }

    /// Infer the format from a source path or URL suffix.
    pub fn infer(source: &str) -> Option<Self> {
        let lower = source.to_ascii_lowercase();
        if lower.ends_with(".stl") {
            Some(Self::Stl)
        } else if lower.ends_with(".obj") {
            Some(Self::Obj)
        } else if lower.ends_with(".3mf") {
            Some(Self::ThreeMf)
        } else {
            None
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stl => write!(f, "stl"),
            Self::Obj => write!(f, "obj"),
            Self::ThreeMf => write!(f, "3mf"),
        }
    }
}

/// Errors surfaced to the host when a model cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch model bytes from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("failed to read model bytes at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot determine mesh format for '{source_str}'; pass the format explicitly")]
    UnknownFormat { source_str: String },
    #[error("failed to parse STL data: {source}")]
    Stl {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse OBJ data: {source}")]
    Obj {
        #[source]
        source: tobj::LoadError,
    },
    #[error("failed to open 3MF archive: {source}")]
    ThreeMfArchive {
        #[source]
        source: zip::result::ZipError,
    },
    #[error("3MF archive has no 3D model part")]
    ThreeMfMissingModel,
    #[error("failed to parse 3MF model XML: {source}")]
    ThreeMfXml {
        #[source]
        source: quick_xml::Error,
    },
    #[error("malformed 3MF model: {detail}")]
    ThreeMfMalformed { detail: String },
    #[error("model contains no triangles")]
    EmptyMesh,
}

/// Fetch raw model bytes. HTTP(S) sources go over the network; everything
/// else is treated as a filesystem path.
pub fn fetch_bytes(source: &str) -> Result<Vec<u8>, LoadError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = ureq::get(source).call().map_err(|err| LoadError::Fetch {
            url: source.to_string(),
            source: Box::new(err),
        })?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|err| LoadError::Read {
                path: source.to_string(),
                source: err,
            })?;
        Ok(bytes)
    } else {
        std::fs::read(source).map_err(|err| LoadError::Read {
            path: source.to_string(),
            source: err,
        })
    }
}

/// Parse already-fetched bytes as the given format.
pub fn parse_mesh(bytes: &[u8], format: MeshFormat) -> Result<TriangleMesh, LoadError> {
    let mesh = match format {
        MeshFormat::Stl => stl::parse(bytes)?,
        MeshFormat::Obj => obj::parse(bytes)?,
        MeshFormat::ThreeMf => three_mf::parse(bytes)?,
    };
    if mesh.is_empty() {
        return Err(LoadError::EmptyMesh);
    }
    log::debug!(
        "parsed {} model: {} vertices, {} triangles",
        format,
        mesh.positions.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Load a mesh from a path or URL, with optional explicit format.
///
/// When `format` is `None` it is inferred from the source suffix; if that
/// also fails, loading errors out rather than guessing at the content.
pub fn load(source: &str, format: Option<MeshFormat>) -> Result<TriangleMesh, LoadError> {
    let format = format
        .or_else(|| MeshFormat::infer(source))
        .ok_or_else(|| LoadError::UnknownFormat {
            source_str: source.to_string(),
        })?;
    let bytes = fetch_bytes(source)?;
    parse_mesh(&bytes, format)
}

// ========================================================================
// Tests
// ========================================================================
