use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

use emberkv_common::{
    ClientError, ConnectionError, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RECONNECT_DELAY_MS,
    INITIAL_BUFFER_CAPACITY,
};
use emberkv_protocol::{Op, Request, Response, Status};

/// Configuração do cliente.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endereço do servidor, ex: "127.0.0.1:6464".
    pub addr: String,
    /// Reconectar automaticamente após queda da conexão.
    pub reconnect: bool,
    /// Espera entre tentativas de reconexão.
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            reconnect: true,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

type Outcome = Result<Option<Bytes>, ClientError>;

/// Estado compartilhado entre a API pública e a tarefa de supervisão.
struct Shared {
    /// Requisições aguardando resposta, indexadas pelo id do frame.
    pending: DashMap<u64, oneshot::Sender<Outcome>>,
    /// Gerador do id de correlação, monotônico por instância de cliente.
    next_id: AtomicU64,
    /// Canal de saída da conexão ativa; None enquanto desconectado.
    outbound: Mutex<Option<mpsc::UnboundedSender<Request>>>,
}

/// Cliente assíncrono com multiplexação de requisições.
///
/// Várias requisições podem estar em voo na mesma conexão; cada resposta
/// é correlacionada pelo id. Na queda da conexão todos os pendentes
/// falham de imediato com `ClientError::ConnectionLost` e, se
/// configurado, uma nova conexão é tentada após o atraso. Requisições
/// que falharam nunca são reenviadas — o chamador decide.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    /// Conecta ao servidor e inicia a tarefa de supervisão da conexão.
    ///
    /// Falha de imediato se o servidor não estiver alcançável.
    pub async fn connect(config: ClientConfig) -> Result<Client, ClientError> {
        let stream = TcpStream::connect(&config.addr).await?;

        // O canal de saída entra no estado compartilhado antes do spawn:
        // uma requisição logo após o connect já encontra a conexão ativa.
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            outbound: Mutex::new(Some(tx)),
        });

        let client = Client {
            shared: shared.clone(),
        };
        tokio::spawn(supervise(config, shared, stream, rx));

        Ok(client)
    }

    /// Grava um valor; o prazo de expiração da chave é reiniciado.
    pub async fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Result<(), ClientError> {
        self.request(Op::Write, key.into(), value.into())
            .await
            .map(|_| ())
    }

    /// Lê um valor; `None` quando a chave não existe (ou já expirou).
    pub async fn get(&self, key: impl Into<String>) -> Result<Option<Bytes>, ClientError> {
        self.request(Op::Read, key.into(), Bytes::new()).await
    }

    /// Lê e remove; `None` quando a chave não existe.
    pub async fn take(&self, key: impl Into<String>) -> Result<Option<Bytes>, ClientError> {
        self.request(Op::Take, key.into(), Bytes::new()).await
    }

    async fn request(&self, op: Op, key: String, value: Bytes) -> Outcome {
        // Falha imediata sem conexão ativa — nada toca o transporte
        let tx = {
            let outbound = self.shared.outbound.lock().await;
            outbound.clone().ok_or(ClientError::Disconnected)?
        };

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();
        self.shared.pending.insert(id, done_tx);

        if tx.send(Request { id, op, key, value }).is_err() {
            // A conexão caiu entre a checagem e o envio
            self.shared.pending.remove(&id);
            return Err(ClientError::Disconnected);
        }

        match done_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ClientError::ConnectionLost),
        }
    }
}

/// Tarefa de fundo que supervisiona o ciclo de vida da conexão.
async fn supervise(
    config: ClientConfig,
    shared: Arc<Shared>,
    first: TcpStream,
    first_rx: mpsc::UnboundedReceiver<Request>,
) {
    let mut active = Some((first, first_rx));

    loop {
        let (socket, rx) = match active.take() {
            Some(pair) => pair,
            None => match TcpStream::connect(&config.addr).await {
                Ok(socket) => {
                    debug!("reconectado a {}", config.addr);
                    let (tx, rx) = mpsc::unbounded_channel();
                    *shared.outbound.lock().await = Some(tx);
                    (socket, rx)
                }
                Err(e) => {
                    warn!("falha ao reconectar em {}: {e}", config.addr);
                    sleep(config.reconnect_delay).await;
                    continue;
                }
            },
        };

        if let Err(e) = run_connection(socket, rx, &shared).await {
            debug!("conexão encerrada: {e}");
        }

        *shared.outbound.lock().await = None;
        fail_pending(&shared);

        if !config.reconnect {
            return;
        }
        sleep(config.reconnect_delay).await;
    }
}

/// Loop de uma conexão: escreve requisições da fila e resolve respostas.
async fn run_connection(
    socket: TcpStream,
    mut requests: mpsc::UnboundedReceiver<Request>,
    shared: &Shared,
) -> Result<(), ConnectionError> {
    let mut stream = BufWriter::new(socket);
    let mut buffer = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
    let mut out = BytesMut::new();

    loop {
        tokio::select! {
            maybe = requests.recv() => {
                let Some(request) = maybe else { return Ok(()) };
                out.clear();
                request.encode(&mut out);
                stream.write_all(&out).await?;
                stream.flush().await?;
            }
            result = stream.read_buf(&mut buffer) => {
                let n = result?;
                if n == 0 {
                    if buffer.is_empty() {
                        return Ok(());
                    }
                    return Err(ConnectionError::ConnectionReset);
                }

                while let Some(item) = Response::extract(&mut buffer) {
                    match item {
                        Ok(response) => resolve(shared, response),
                        Err(e) => {
                            // Resposta indecifrável: falha só o pendente dela
                            warn!("frame de resposta inválido: {e}");
                            if let Some((_, done)) = shared.pending.remove(&e.id()) {
                                let _ = done.send(Err(ClientError::Protocol(e)));
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Resolve o pendente correspondente à resposta, se ainda existir.
fn resolve(shared: &Shared, response: Response) {
    let Some((_, done)) = shared.pending.remove(&response.id) else {
        // Resposta para id já resolvido/limpo: descarte silencioso
        debug!("resposta sem pendente: id={}", response.id);
        return;
    };

    let outcome = match response.status {
        Status::Ok => Ok(Some(response.payload)),
        Status::NotFound => Ok(None),
        Status::Error => Err(ClientError::Server(
            String::from_utf8_lossy(&response.payload).into_owned(),
        )),
    };
    let _ = done.send(outcome);
}

/// Falha todos os pendentes de imediato. Nenhum é reenviado.
fn fail_pending(shared: &Shared) {
    let ids: Vec<u64> = shared.pending.iter().map(|item| *item.key()).collect();
    for id in ids {
        if let Some((_, done)) = shared.pending.remove(&id) {
            let _ = done.send(Err(ClientError::ConnectionLost));
        }
    }
}
