//! # Tabla de Tipos MIME
//! src/http/mime.rs
//!
//! Mapeo fijo de extensión (con el punto inicial) a Content-Type. Es una
//! tabla constante: se puede consultar desde cualquier thread sin
//! sincronización.

/// Extensiones soportadas y su Content-Type
const MIME_TYPES: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".jpg", "image/jpeg"),
    (".css", "text/css"),
    (".js", "text/javascript"),
];

/// Busca el Content-Type de una extensión
///
/// La comparación es exacta: no hay comodines ni mayúsculas/minúsculas.
///
/// # Ejemplo
/// ```
/// use static_server::http::mime;
///
/// assert_eq!(mime::lookup(".html"), Some("text/html"));
/// assert_eq!(mime::lookup(".HTML"), None);
/// ```
pub fn lookup(extension: &str) -> Option<&'static str> {
    MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
}

/// Extrae la extensión de un nombre de archivo: desde el último `.` hasta el final
///
/// Un nombre sin punto no tiene extensión.
pub fn extension_of(file_name: &str) -> Option<&str> {
    file_name.rfind('.').map(|idx| &file_name[idx..])
}

/// Todas las extensiones soportadas
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    MIME_TYPES.iter().map(|(ext, _)| *ext)
}
