use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use emberkv_common::{ConnectionError, FrameError, INITIAL_BUFFER_CAPACITY};
use emberkv_protocol::{Request, Response};

/// Wrapper sobre TcpStream com o buffer residual de remontagem.
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Lê a próxima requisição completa do stream. Retorna None no EOF limpo.
    ///
    /// Um frame corrompido chega como `Some(Err(_))`: o buffer já avançou
    /// além dele e o chamador só decide a resposta de diagnóstico.
    pub async fn read_request(
        &mut self,
    ) -> Result<Option<Result<Request, FrameError>>, ConnectionError> {
        loop {
            if let Some(item) = Request::extract(&mut self.buffer) {
                return Ok(Some(item));
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ConnectionError::ConnectionReset);
            }
        }
    }

    /// Escreve uma resposta no stream.
    pub async fn write_response(&mut self, response: &Response) -> Result<(), ConnectionError> {
        let mut buf = BytesMut::new();
        response.encode(&mut buf);
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
