use tokio::sync::broadcast;
use tracing::debug;

use emberkv_common::ConnectionError;
use emberkv_protocol::{Op, Request, Response};
use emberkv_store::Store;

use crate::Connection;

/// Loop principal de tratamento de uma conexão.
///
/// Cada frame bem-formado vira exatamente uma resposta, escrita de forma
/// síncrona na mesma conexão e na ordem de chegada. Erros de protocolo
/// viram respostas ERROR; nunca derrubam a conexão.
pub async fn handle_connection(
    mut conn: Connection,
    store: Store,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let inbound = tokio::select! {
            result = conn.read_request() => result?,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let response = match inbound {
            Some(Ok(request)) => {
                debug!("requisição recebida: id={} op={:?} key={:?}", request.id, request.op, request.key);
                execute_request(request, &store)
            }
            // Frame corrompido: o diagnóstico responde só aquele frame,
            // os seguintes no stream não são afetados
            Some(Err(frame_error)) => {
                debug!("frame descartado: {frame_error}");
                Response::error(frame_error.id(), frame_error.to_string())
            }
            None => return Ok(()), // EOF
        };

        conn.write_response(&response).await?;
    }
}

/// Executa uma requisição contra o store e monta a resposta.
fn execute_request(request: Request, store: &Store) -> Response {
    match request.op {
        Op::Write => {
            store.write(request.key, request.value);
            Response::ok(request.id, bytes::Bytes::new())
        }
        Op::Read => match store.read(&request.key) {
            Some(value) => Response::ok(request.id, value),
            None => Response::not_found(request.id),
        },
        Op::Take => match store.take(&request.key) {
            Some(value) => Response::ok(request.id, value),
            None => Response::not_found(request.id),
        },
    }
}
