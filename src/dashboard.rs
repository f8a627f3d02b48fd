//! Editor dashboard: per-collection counts and a recent-activity feed.
//!
//! The five collections are loaded in parallel with rayon. A collection
//! that fails to load counts as zero and is listed in
//! [`Summary::failed`]; the rest of the summary is still built.

use crate::collections::Newsletter;
use crate::content::CollectionKind;
use crate::store::{Document, FIELD_CREATED_AT, FIELD_ID, Listing, Query};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

/// Author shown for items that carry none.
pub const UNKNOWN_AUTHOR: &str = "Autor desconhecido";

/// How many of the newest items each collection contributes to the feed.
const RECENT_PER_COLLECTION: &[(CollectionKind, usize, &str)] = &[
    (CollectionKind::Noticias, 3, "noticia"),
    (CollectionKind::Eventos, 2, "evento"),
    (CollectionKind::Avisos, 2, "aviso"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub noticias: usize,
    pub eventos: usize,
    pub avisos: usize,
    pub galeria: usize,
    pub destaques: usize,
}

impl Counts {
    fn slot(&mut self, kind: CollectionKind) -> &mut usize {
        match kind {
            CollectionKind::Noticias => &mut self.noticias,
            CollectionKind::Eventos => &mut self.eventos,
            CollectionKind::Avisos => &mut self.avisos,
            CollectionKind::Galeria => &mut self.galeria,
            CollectionKind::Destaques => &mut self.destaques,
        }
    }
}

/// One entry of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// `<tipo>_<document id>`
    pub id: String,
    pub tipo: &'static str,
    pub titulo: String,
    pub autor: String,
    pub created_at: i64,
    pub acao: &'static str,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub counts: Counts,
    pub recent: Vec<Activity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

/// Load every collection and build the dashboard summary.
pub fn summarize(newsletter: &Newsletter, recent_limit: usize) -> Summary {
    let gateway = newsletter.gateway();
    let loaded: Vec<(CollectionKind, Option<Listing>)> = CollectionKind::ALL
        .par_iter()
        .map(|&kind| match gateway.list(kind.path(), &Query::new()) {
            Ok(listing) => (kind, Some(listing)),
            Err(e) => {
                tracing::warn!(collection = %kind, error = %e, "dashboard load failed");
                (kind, None)
            }
        })
        .collect();

    let mut summary = Summary::default();
    for (kind, listing) in &loaded {
        match listing {
            Some(listing) => *summary.counts.slot(*kind) = listing.count,
            None => summary.failed.push(kind.path().to_string()),
        }
    }

    for &(kind, take, tipo) in RECENT_PER_COLLECTION {
        let Some((_, Some(listing))) = loaded.iter().find(|(k, _)| *k == kind) else {
            continue;
        };
        summary.recent.extend(
            listing
                .data
                .iter()
                .take(take)
                .map(|doc| activity(kind, tipo, doc)),
        );
    }
    summary
        .recent
        .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    summary.recent.truncate(recent_limit);

    tracing::debug!(
        recent = summary.recent.len(),
        failed = summary.failed.len(),
        "dashboard summarized"
    );
    summary
}

fn text(doc: &Document, field: &str) -> Option<String> {
    doc.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn activity(kind: CollectionKind, tipo: &'static str, doc: &Document) -> Activity {
    let id = text(doc, FIELD_ID).unwrap_or_default();
    Activity {
        id: format!("{tipo}_{id}"),
        tipo,
        titulo: text(doc, "titulo").unwrap_or_default(),
        autor: text(doc, "autor").unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        created_at: doc
            .get(FIELD_CREATED_AT)
            .and_then(Value::as_i64)
            .unwrap_or(0),
        acao: "criou",
        link: format!("/{}/{id}", kind.path()),
    }
}
