use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Projeto {0} não encontrado")]
    ProjectNotFound(Uuid),

    #[error("Elemento {0} não encontrado")]
    ElementNotFound(Uuid),

    #[error("Job {0} não encontrado")]
    JobNotFound(Uuid),

    #[error("Workflow '{0}' não encontrado")]
    WorkflowNotFound(String),

    // Falhas do colaborador de dados: propagadas sem retry
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de acesso a dados: {0}")]
    StoreError(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Mensagem curta, sem detalhes internos (usada nos relatórios de lote).
    pub fn public_reason(&self) -> String {
        match self {
            AppError::DatabaseError(_)
            | AppError::StoreError(_)
            | AppError::InternalServerError(_) => {
                "Falha ao gravar no armazenamento.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, por campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ref e @ (AppError::ProjectNotFound(_)
            | AppError::ElementNotFound(_)
            | AppError::JobNotFound(_)
            | AppError::WorkflowNotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),

            // Todos os outros erros (DatabaseError, StoreError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada, o cliente recebe uma genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
