//! # Resolución de Rutas
//! src/resolver/mod.rs
//!
//! Traduce la ruta pedida por el cliente a un archivo dentro del web root.
//!
//! Un request se resuelve como `Found` sólo si:
//! 1. La ruta normalizada no se sale del web root (ni con `..` ni con symlinks)
//! 2. El nombre del archivo tiene extensión (lo que sigue al último `.`)
//! 3. Esa extensión está en la tabla MIME
//! 4. El archivo existe y es un archivo regular
//!
//! Cualquier otro caso es `NotFound`, que no es un error sino un 404.

use crate::error::ServerError;
use crate::http::mime;
use std::fmt;
use std::path::{Path, PathBuf};

/// Resultado de resolver una ruta
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Archivo servible, con su ruta absoluta y su Content-Type
    Found {
        path: PathBuf,
        content_type: &'static str,
    },

    /// No hay nada que servir para esta ruta
    NotFound { path: PathBuf, reason: Miss },
}

/// Motivo por el que una ruta no se resolvió
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// El nombre no tiene `.`
    NoExtension,
    /// La extensión no está en la tabla MIME
    UnsupportedExtension,
    /// No existe en disco
    Missing,
    /// Existe pero no es un archivo regular (ej: un directorio)
    NotAFile,
    /// La ruta intentó salir del web root
    OutsideRoot,
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Miss::NoExtension => "no extension",
            Miss::UnsupportedExtension => "unsupported extension",
            Miss::Missing => "missing",
            Miss::NotAFile => "not a file",
            Miss::OutsideRoot => "outside web root",
        };
        f.write_str(text)
    }
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    /// Ruta absoluta asociada al resultado
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Found { path, .. } | Resolution::NotFound { path, .. } => path,
        }
    }
}

/// Resuelve rutas contra un web root fijo
///
/// Se construye una vez al arrancar y se comparte (sólo lectura) entre todos
/// los workers.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Web root canónico (absoluto, sin symlinks)
    root: PathBuf,
}

impl PathResolver {
    /// Crea el resolver validando que el web root sea un directorio existente
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ServerError> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|source| ServerError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        })?;

        if !canonical.is_dir() {
            return Err(ServerError::InvalidRoot {
                path: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resuelve la ruta de un request (ya sin query string)
    pub fn resolve(&self, request_path: &str) -> Resolution {
        let relative = match normalize(request_path) {
            Some(relative) => relative,
            None => {
                return Resolution::NotFound {
                    path: self.root.clone(),
                    reason: Miss::OutsideRoot,
                };
            }
        };

        let candidate = self.root.join(&relative);
        let not_found = |path: PathBuf, reason| Resolution::NotFound { path, reason };

        // `/index.html/` o `/index.html/.` piden un directorio, no el archivo
        if request_path.ends_with('/') || request_path.ends_with("/.") {
            return not_found(candidate, Miss::NotAFile);
        }

        let file_name = match relative.file_name().and_then(|name| name.to_str()) {
            Some(name) => name,
            None => return not_found(candidate, Miss::NotAFile),
        };

        let content_type = match mime::extension_of(file_name) {
            None => return not_found(candidate, Miss::NoExtension),
            Some(extension) => match mime::lookup(extension) {
                Some(content_type) => content_type,
                None => return not_found(candidate, Miss::UnsupportedExtension),
            },
        };

        let canonical = match candidate.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => return not_found(candidate, Miss::Missing),
        };

        // Un symlink dentro del root puede apuntar afuera
        if !canonical.starts_with(&self.root) {
            return not_found(candidate, Miss::OutsideRoot);
        }

        if !canonical.is_file() {
            return not_found(candidate, Miss::NotAFile);
        }

        Resolution::Found {
            path: canonical,
            content_type,
        }
    }
}

/// Normaliza la ruta pedida a una ruta relativa al root
///
/// Descarta segmentos vacíos y `.`, y `..` retrocede un nivel. Devuelve
/// `None` si algún `..` intenta subir por encima del root.
fn normalize(request_path: &str) -> Option<PathBuf> {
    let mut result = PathBuf::new();

    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if !result.pop() {
                    return None;
                }
            }
            segment => result.push(segment),
        }
    }

    Some(result)
}
