use bytes::{BufMut, Bytes, BytesMut};

/// Cabeçalho de requisição: id(8) + op(1) + key_len(4) + value_len(4).
pub const REQUEST_HEADER_LEN: usize = 17;
/// Cabeçalho de resposta: id(8) + status(1) + payload_len(4).
pub const RESPONSE_HEADER_LEN: usize = 13;
/// Byte sentinela no fim de cada frame de requisição.
///
/// O limite do frame já vem dos campos de comprimento do cabeçalho; o
/// sentinela é só uma checagem de integridade na fronteira calculada.
pub const END_MARKER: u8 = 0xFF;

/// Operação solicitada pelo cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Grava o valor e reinicia o prazo de expiração da chave.
    Write,
    /// Lê o valor sem alterar o prazo.
    Read,
    /// Lê e remove a chave numa única operação.
    Take,
}

impl Op {
    pub fn as_byte(self) -> u8 {
        match self {
            Op::Write => 0x00,
            Op::Read => 0x01,
            Op::Take => 0x02,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Op> {
        match byte {
            0x00 => Some(Op::Write),
            0x01 => Some(Op::Read),
            0x02 => Some(Op::Take),
            _ => None,
        }
    }
}

/// Status de uma resposta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    NotFound,
}

impl Status {
    pub fn as_byte(self) -> u8 {
        match self {
            Status::Ok => 0xA0,
            Status::Error => 0xA1,
            Status::NotFound => 0xA2,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Status> {
        match byte {
            0xA0 => Some(Status::Ok),
            0xA1 => Some(Status::Error),
            0xA2 => Some(Status::NotFound),
            _ => None,
        }
    }
}

/// Frame de requisição decodificado.
///
/// O id é um token opaco escolhido pelo remetente; o servidor só o copia
/// de volta na resposta. A chave é UTF-8, o valor é binário opaco.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: u64,
    pub op: Op,
    pub key: String,
    pub value: Bytes,
}

impl Request {
    pub fn new(id: u64, op: Op, key: impl Into<String>, value: impl Into<Bytes>) -> Request {
        Request {
            id,
            op,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Codifica o frame no buffer de saída. Nunca falha.
    ///
    /// Layout: `id(8) | op(1) | key_len(4) | value_len(4) | key | value | 0xFF`,
    /// inteiros big-endian.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u64(self.id);
        dst.put_u8(self.op.as_byte());
        dst.put_u32(self.key.len() as u32);
        dst.put_u32(self.value.len() as u32);
        dst.put(self.key.as_bytes());
        dst.put(self.value.as_ref());
        dst.put_u8(END_MARKER);
    }
}

/// Frame de resposta decodificado.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: u64,
    pub status: Status,
    pub payload: Bytes,
}

impl Response {
    /// Sucesso com payload (o valor lido; vazio para escritas).
    pub fn ok(id: u64, payload: impl Into<Bytes>) -> Response {
        Response {
            id,
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    /// Chave ausente. Não é um erro: payload sempre vazio.
    pub fn not_found(id: u64) -> Response {
        Response {
            id,
            status: Status::NotFound,
            payload: Bytes::new(),
        }
    }

    /// Falha com mensagem de diagnóstico legível.
    pub fn error(id: u64, message: impl Into<String>) -> Response {
        Response {
            id,
            status: Status::Error,
            payload: Bytes::from(message.into()),
        }
    }

    /// Codifica o frame no buffer de saída. Nunca falha.
    ///
    /// Layout: `id(8) | status(1) | payload_len(4) | payload`, sem sentinela.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u64(self.id);
        dst.put_u8(self.status.as_byte());
        dst.put_u32(self.payload.len() as u32);
        dst.put(self.payload.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout_is_byte_exact() {
        let request = Request::new(0x0102030405060708, Op::Read, "ab", &b"xyz"[..]);
        let mut buf = BytesMut::new();
        request.encode(&mut buf);

        assert_eq!(buf.len(), REQUEST_HEADER_LEN + 2 + 3 + 1);
        // id big-endian
        assert_eq!(&buf[0..8], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        // op READ
        assert_eq!(buf[8], 0x01);
        // comprimentos big-endian
        assert_eq!(&buf[9..13], &[0x00, 0x00, 0x00, 0x02]);
        assert_eq!(&buf[13..17], &[0x00, 0x00, 0x00, 0x03]);
        assert_eq!(&buf[17..19], b"ab");
        assert_eq!(&buf[19..22], b"xyz");
        assert_eq!(buf[22], END_MARKER);
    }

    #[test]
    fn response_layout_is_byte_exact() {
        let response = Response::ok(0x1122334455667788, &b"v"[..]);
        let mut buf = BytesMut::new();
        response.encode(&mut buf);

        assert_eq!(buf.len(), RESPONSE_HEADER_LEN + 1);
        assert_eq!(&buf[0..8], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
        assert_eq!(buf[8], 0xA0);
        assert_eq!(&buf[9..13], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(buf[13], b'v');
    }

    #[test]
    fn op_codes() {
        assert_eq!(Op::Write.as_byte(), 0x00);
        assert_eq!(Op::Read.as_byte(), 0x01);
        assert_eq!(Op::Take.as_byte(), 0x02);
        assert_eq!(Op::from_byte(0x02), Some(Op::Take));
        assert_eq!(Op::from_byte(0x99), None);
    }

    #[test]
    fn status_codes() {
        assert_eq!(Status::Ok.as_byte(), 0xA0);
        assert_eq!(Status::Error.as_byte(), 0xA1);
        assert_eq!(Status::NotFound.as_byte(), 0xA2);
        assert_eq!(Status::from_byte(0xA2), Some(Status::NotFound));
        assert_eq!(Status::from_byte(0x00), None);
    }

    #[test]
    fn not_found_has_empty_payload() {
        let response = Response::not_found(9);
        assert_eq!(response.status, Status::NotFound);
        assert!(response.payload.is_empty());
    }

    #[test]
    fn error_payload_is_message_text() {
        let response = Response::error(9, "algo deu errado");
        assert_eq!(&response.payload[..], b"algo deu errado");
    }
}
