//! Remontagem de frames a partir de um stream fragmentado.
//!
//! O buffer residual pertence ao dono da conexão; as funções aqui só
//! extraem o que estiver completo. Um frame parcial sobrevive a qualquer
//! número de chegadas — nada é consumido antes do frame inteiro chegar.

use bytes::{Buf, Bytes, BytesMut};

use emberkv_common::FrameError;

use crate::frame::{END_MARKER, Op, REQUEST_HEADER_LEN, RESPONSE_HEADER_LEN, Request, Response, Status};

impl Request {
    /// Tenta extrair o próximo frame de requisição completo do buffer.
    ///
    /// `None` enquanto faltam bytes. Um frame corrompido (sentinela errado,
    /// op desconhecida, chave não-UTF-8) é consumido mesmo assim: o stream
    /// continua alinhado e o erro carrega o id para o diagnóstico.
    pub fn extract(buf: &mut BytesMut) -> Option<Result<Request, FrameError>> {
        if buf.len() < REQUEST_HEADER_LEN {
            return None;
        }

        let mut header = &buf[..REQUEST_HEADER_LEN];
        let id = header.get_u64();
        let op_byte = header.get_u8();
        let key_len = header.get_u32() as usize;
        let value_len = header.get_u32() as usize;

        let total = REQUEST_HEADER_LEN + key_len + value_len + 1;
        if buf.len() < total {
            return None;
        }

        let frame = buf.split_to(total);

        // Sentinela primeiro: o limite veio do cabeçalho, o último byte
        // só confere integridade.
        let end = frame[total - 1];
        if end != END_MARKER {
            return Some(Err(FrameError::BadEndMarker { id, found: end }));
        }

        let Some(op) = Op::from_byte(op_byte) else {
            return Some(Err(FrameError::UnknownOp { id, op: op_byte }));
        };

        let key_bytes = &frame[REQUEST_HEADER_LEN..REQUEST_HEADER_LEN + key_len];
        let Ok(key) = std::str::from_utf8(key_bytes) else {
            return Some(Err(FrameError::InvalidKey { id }));
        };
        let key = key.to_string();
        let value =
            Bytes::copy_from_slice(&frame[REQUEST_HEADER_LEN + key_len..total - 1]);

        Some(Ok(Request { id, op, key, value }))
    }
}

impl Response {
    /// Tenta extrair o próximo frame de resposta completo do buffer.
    ///
    /// Respostas não têm sentinela; a única corrupção detectável é um
    /// byte de status desconhecido.
    pub fn extract(buf: &mut BytesMut) -> Option<Result<Response, FrameError>> {
        if buf.len() < RESPONSE_HEADER_LEN {
            return None;
        }

        let mut header = &buf[..RESPONSE_HEADER_LEN];
        let id = header.get_u64();
        let status_byte = header.get_u8();
        let payload_len = header.get_u32() as usize;

        let total = RESPONSE_HEADER_LEN + payload_len;
        if buf.len() < total {
            return None;
        }

        let frame = buf.split_to(total);

        let Some(status) = Status::from_byte(status_byte) else {
            return Some(Err(FrameError::UnknownStatus { id, status: status_byte }));
        };
        let payload = Bytes::copy_from_slice(&frame[RESPONSE_HEADER_LEN..]);

        Some(Ok(Response { id, status, payload }))
    }
}
