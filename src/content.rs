//! Typed content: one serde struct per collection.
//!
//! Field names are the Portuguese names stored in the documents. Required
//! fields are plain `String`s (blank when absent); optional ones are
//! `Option`s and are left out of the stored JSON when `None`.
//!
//! | Type | Collection | Required |
//! |---|---|---|
//! | [`Noticia`] | `noticias` | titulo, categoria, resumo, conteudo, autor |
//! | [`Evento`] | `eventos` | titulo, tipo, descricao |
//! | [`Aviso`] | `avisos` | titulo, tipo, conteudo |
//! | [`ItemGaleria`] | `galeria` | titulo, categoria |
//! | [`Destaque`] | `destaques` | titulo, descricao |

use crate::store::{Document, Fields, FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Author recorded when the editor has no signed-in user.
pub const DEFAULT_AUTHOR: &str = "Sistema";
/// Status given to news published from the editor.
pub const STATUS_PUBLISHED: &str = "publicada";

/// A content type stored in its own collection.
pub trait Content: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path, e.g. `noticias`.
    const COLLECTION: &'static str;
    /// Fields that must be non-blank on create.
    const REQUIRED: &'static [&'static str];

    /// Required fields that are missing or blank, in declaration order.
    fn missing_fields(&self) -> Vec<&'static str> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => missing_in(&fields, Self::REQUIRED),
            _ => Self::REQUIRED.to_vec(),
        }
    }
}

/// Required fields in `required` that are absent or blank in `fields`.
pub fn missing_in(fields: &Fields, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|name| {
            fields
                .get(*name)
                .and_then(Value::as_str)
                .is_none_or(|s| s.trim().is_empty())
        })
        .collect()
}

// ============================================================================
// Content types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Noticia {
    pub titulo: String,
    pub categoria: String,
    pub resumo: String,
    pub conteudo: String,
    pub autor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl Noticia {
    /// A news item as the editor publishes it: status `publicada`, the
    /// lowercased category as tags, and `Sistema` when there is no author.
    pub fn publicada(
        titulo: impl Into<String>,
        categoria: impl Into<String>,
        resumo: impl Into<String>,
        conteudo: impl Into<String>,
        autor: Option<&str>,
    ) -> Self {
        let categoria = categoria.into();
        let autor = autor
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUTHOR);
        Self {
            titulo: titulo.into(),
            tags: Some(categoria.to_lowercase()),
            categoria,
            resumo: resumo.into(),
            conteudo: conteudo.into(),
            autor: autor.to_string(),
            imagem: None,
            status: Some(STATUS_PUBLISHED.to_string()),
        }
    }
}

impl Content for Noticia {
    const COLLECTION: &'static str = "noticias";
    const REQUIRED: &'static [&'static str] =
        &["titulo", "categoria", "resumo", "conteudo", "autor"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evento {
    pub titulo: String,
    /// `academico`, `cultural` or `esportivo`.
    pub tipo: String,
    pub descricao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autor: Option<String>,
}

impl Content for Evento {
    const COLLECTION: &'static str = "eventos";
    const REQUIRED: &'static [&'static str] = &["titulo", "tipo", "descricao"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aviso {
    pub titulo: String,
    /// `urgente`, `importante` or `informativo`.
    pub tipo: String,
    pub conteudo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autor: Option<String>,
}

impl Content for Aviso {
    const COLLECTION: &'static str = "avisos";
    const REQUIRED: &'static [&'static str] = &["titulo", "tipo", "conteudo"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemGaleria {
    pub titulo: String,
    pub categoria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagem: Option<String>,
}

impl Content for ItemGaleria {
    const COLLECTION: &'static str = "galeria";
    const REQUIRED: &'static [&'static str] = &["titulo", "categoria"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Destaque {
    pub titulo: String,
    pub descricao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagem: Option<String>,
}

impl Content for Destaque {
    const COLLECTION: &'static str = "destaques";
    const REQUIRED: &'static [&'static str] = &["titulo", "descricao"];
}

// ============================================================================
// Stored items
// ============================================================================

/// A content item read back from the store, with its system fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: i64,
    #[serde(flatten)]
    pub item: T,
}

impl<T: Content> Stored<T> {
    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc))
    }
}

/// Serialize an item into document fields, without system fields.
pub fn to_fields<T: Content>(item: &T) -> Result<Fields, serde_json::Error> {
    let mut fields = match serde_json::to_value(item)? {
        Value::Object(fields) => fields,
        other => {
            return Err(serde::ser::Error::custom(format!(
                "{} item serialized to {other}, expected an object",
                T::COLLECTION
            )));
        }
    };
    for system in [FIELD_ID, FIELD_CREATED_AT, FIELD_UPDATED_AT] {
        fields.remove(system);
    }
    Ok(fields)
}

// ============================================================================
// Collection names
// ============================================================================

/// The five collections, for callers that pick one at runtime (the CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Noticias,
    Eventos,
    Avisos,
    Galeria,
    Destaques,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::Noticias,
        CollectionKind::Eventos,
        CollectionKind::Avisos,
        CollectionKind::Galeria,
        CollectionKind::Destaques,
    ];

    pub fn path(self) -> &'static str {
        match self {
            CollectionKind::Noticias => Noticia::COLLECTION,
            CollectionKind::Eventos => Evento::COLLECTION,
            CollectionKind::Avisos => Aviso::COLLECTION,
            CollectionKind::Galeria => ItemGaleria::COLLECTION,
            CollectionKind::Destaques => Destaque::COLLECTION,
        }
    }

    pub fn required(self) -> &'static [&'static str] {
        match self {
            CollectionKind::Noticias => Noticia::REQUIRED,
            CollectionKind::Eventos => Evento::REQUIRED,
            CollectionKind::Avisos => Aviso::REQUIRED,
            CollectionKind::Galeria => ItemGaleria::REQUIRED,
            CollectionKind::Destaques => Destaque::REQUIRED,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.path() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = CollectionKind::ALL.iter().map(|k| k.path()).collect();
                format!("unknown collection `{s}` (expected one of: {})", names.join(", "))
            })
    }
}
