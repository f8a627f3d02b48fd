//! The `{success, id?, data?, count?, error?, message}` result envelope.
//!
//! Gateway results are typed; this is the flat shape front-ends and the CLI
//! print. A missing document is `success: false` with a message but no
//! `error`, so callers can show an empty state instead of an error banner.

use super::gateway::{Created, Document, GatewayError, Listing, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MSG_CREATED: &str = "Documento criado com sucesso";
pub const MSG_FOUND: &str = "Documento encontrado";
pub const MSG_LISTED: &str = "Documentos encontrados";
pub const MSG_EMPTY: &str = "Nenhum documento encontrado";
pub const MSG_UPDATED: &str = "Documento atualizado com sucesso";
pub const MSG_DELETED: &str = "Documento excluído com sucesso";
pub const MSG_NOT_FOUND: &str = "Documento não encontrado";
pub const MSG_INVALID: &str = "Campos obrigatórios não preenchidos";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl Response {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            id: None,
            data: None,
            count: None,
            error: None,
            message: message.to_string(),
        }
    }

    pub fn failure(err: &GatewayError) -> Self {
        let (error, message) = match err {
            GatewayError::NotFound { .. } => (None, MSG_NOT_FOUND),
            GatewayError::Store { op, source } => {
                (Some(source.to_string()), op.failure_message())
            }
            GatewayError::Invalid { .. } => (Some(err.to_string()), MSG_INVALID),
            GatewayError::Malformed { .. } => {
                (Some(err.to_string()), Operation::Read.failure_message())
            }
        };
        Self {
            success: false,
            id: None,
            data: None,
            count: None,
            error,
            message: message.to_string(),
        }
    }

    pub fn created(result: &Result<Created, GatewayError>) -> Self {
        match result {
            Ok(created) => Self {
                id: Some(created.id.clone()),
                data: Some(Value::Object(created.data.clone())),
                ..Self::ok(MSG_CREATED)
            },
            Err(e) => Self::failure(e),
        }
    }

    pub fn document(result: &Result<Document, GatewayError>) -> Self {
        match result {
            Ok(doc) => Self {
                data: Some(Value::Object(doc.clone())),
                ..Self::ok(MSG_FOUND)
            },
            Err(e) => Self::failure(e),
        }
    }

    pub fn listing(result: &Result<Listing, GatewayError>) -> Self {
        match result {
            Ok(listing) => {
                let message = if listing.is_empty() { MSG_EMPTY } else { MSG_LISTED };
                Self {
                    data: Some(Value::Array(
                        listing.data.iter().cloned().map(Value::Object).collect(),
                    )),
                    count: Some(listing.count),
                    ..Self::ok(message)
                }
            }
            Err(e) => Self::failure(e),
        }
    }

    /// Envelope for `update` (`op = Update`) or `delete` (`op = Delete`).
    pub fn done(op: Operation, result: &Result<(), GatewayError>) -> Self {
        match result {
            Ok(()) if op == Operation::Delete => Self::ok(MSG_DELETED),
            Ok(()) => Self::ok(MSG_UPDATED),
            Err(e) => Self::failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use serde_json::json;

    #[test]
    fn not_found_has_no_error_field() {
        let resp = Response::failure(&GatewayError::NotFound {
            path: "x".into(),
            id: "1".into(),
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            json!({"success": false, "message": "Documento não encontrado"})
        );
    }

    #[test]
    fn store_error_carries_store_message() {
        let resp = Response::failure(&GatewayError::Store {
            op: Operation::Delete,
            source: StoreError::PermissionDenied("write to `x/1` denied".into()),
        });
        assert!(!resp.success);
        assert_eq!(resp.message, "Erro ao excluir documento");
        assert_eq!(
            resp.error.as_deref(),
            Some("permission denied: write to `x/1` denied")
        );
    }

    #[test]
    fn empty_listing_message() {
        let resp = Response::listing(&Ok(Listing::default()));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            json!({"success": true, "data": [], "count": 0, "message": "Nenhum documento encontrado"})
        );
    }

    #[test]
    fn created_envelope_includes_id_and_data() {
        let mut data = Document::new();
        data.insert("id".into(), json!("abc"));
        let resp = Response::created(&Ok(Created {
            id: "abc".into(),
            data,
        }));
        assert_eq!(resp.id.as_deref(), Some("abc"));
        assert_eq!(resp.data, Some(json!({"id": "abc"})));
        assert_eq!(resp.message, MSG_CREATED);
    }

    #[test]
    fn done_messages() {
        assert_eq!(Response::done(Operation::Update, &Ok(())).message, MSG_UPDATED);
        assert_eq!(Response::done(Operation::Delete, &Ok(())).message, MSG_DELETED);
    }

    #[test]
    fn invalid_lists_missing_fields() {
        let resp = Response::failure(&GatewayError::Invalid {
            collection: "avisos".into(),
            missing: vec!["titulo".into(), "tipo".into()],
        });
        assert_eq!(resp.message, MSG_INVALID);
        assert!(resp.error.unwrap().contains("titulo, tipo"));
    }
}
