/// Erros recuperáveis de um único frame do protocolo binário.
///
/// Cada variante carrega o id do frame ofensor: o buffer já avançou além
/// do frame quando o erro é devolvido, então o dono da conexão só precisa
/// do id para responder (servidor) ou resolver o pendente (cliente).
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("marcador final inválido: {found:#04x}")]
    BadEndMarker { id: u64, found: u8 },
    #[error("tipo de requisição desconhecido: {op:#04x}")]
    UnknownOp { id: u64, op: u8 },
    #[error("chave não é UTF-8 válido")]
    InvalidKey { id: u64 },
    #[error("status de resposta desconhecido: {status:#04x}")]
    UnknownStatus { id: u64, status: u8 },
}

impl FrameError {
    /// Id do frame que produziu o erro.
    pub fn id(&self) -> u64 {
        match self {
            FrameError::BadEndMarker { id, .. }
            | FrameError::UnknownOp { id, .. }
            | FrameError::InvalidKey { id }
            | FrameError::UnknownStatus { id, .. } => *id,
        }
    }
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros vistos pelo chamador do cliente.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Requisição feita sem conexão ativa; o transporte não foi tocado.
    #[error("cliente desconectado")]
    Disconnected,
    /// A conexão caiu antes da resposta chegar. A requisição não é reenviada.
    #[error("conexão perdida antes da resposta")]
    ConnectionLost,
    /// O servidor respondeu ERROR com esta mensagem de diagnóstico.
    #[error("erro do servidor: {0}")]
    Server(String),
    #[error("frame de resposta inválido: {0}")]
    Protocol(#[from] FrameError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Erro top-level do EmberKV.
#[derive(Debug, thiserror::Error)]
pub enum EmberError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Result type alias.
pub type EmberResult<T> = Result<T, EmberError>;

// Conversão implícita de io::Error → EmberError (via ConnectionError)
impl From<std::io::Error> for EmberError {
    fn from(e: std::io::Error) -> Self {
        EmberError::Connection(ConnectionError::Io(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_error_display() {
        let err = FrameError::BadEndMarker { id: 7, found: 0x00 };
        assert_eq!(err.to_string(), "marcador final inválido: 0x00");
    }

    #[test]
    fn frame_error_names_unknown_op() {
        let err = FrameError::UnknownOp { id: 1, op: 0x99 };
        assert!(err.to_string().contains("0x99"));
    }

    #[test]
    fn frame_error_exposes_id() {
        assert_eq!(FrameError::BadEndMarker { id: 42, found: 0 }.id(), 42);
        assert_eq!(FrameError::UnknownOp { id: 43, op: 9 }.id(), 43);
        assert_eq!(FrameError::InvalidKey { id: 44 }.id(), 44);
        assert_eq!(FrameError::UnknownStatus { id: 45, status: 9 }.id(), 45);
    }

    #[test]
    fn client_error_display() {
        let err = ClientError::Server("chave bloqueada".into());
        assert_eq!(err.to_string(), "erro do servidor: chave bloqueada");
    }

    #[test]
    fn ember_error_from_frame() {
        let err: EmberError = FrameError::InvalidKey { id: 1 }.into();
        assert!(matches!(err, EmberError::Frame(FrameError::InvalidKey { id: 1 })));
    }

    #[test]
    fn ember_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken");
        let err: EmberError = io_err.into();
        assert!(matches!(err, EmberError::Connection(ConnectionError::Io(_))));
    }
}
