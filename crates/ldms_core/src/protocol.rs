//! Protocolo binário do canal de push (watch → dashboard).
//!
//! Formato do frame:
//!
//! ```text
//! ┌──────────┬─────────┬──────────────────────┐
//! │ Magic(1) │ Ver.(1) │ PushMessage (bincode) │
//! └──────────┴─────────┴──────────────────────┘
//! ```

use crate::notification::PushMessage;

/// Magic byte que identifica frames de push LDMS.
pub const MAGIC_BYTE: u8 = 0x4C; // 'L'

/// Versão atual do protocolo.
pub const PROTOCOL_VERSION: u8 = 1;

/// Tamanho do header (magic + version).
const HEADER_SIZE: usize = 2;

/// Tamanho máximo de pacote UDP seguro (sem fragmentação).
pub const MAX_UDP_PAYLOAD: usize = 65507;

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Pacote muito curto ({0} bytes, mínimo {HEADER_SIZE})")]
    TooShort(usize),

    #[error("Magic byte inválido: 0x{0:02X} (esperado 0x{MAGIC_BYTE:02X})")]
    InvalidMagic(u8),

    #[error("Versão incompatível: {0} (suportada: {PROTOCOL_VERSION})")]
    VersionMismatch(u8),

    #[error("Frame excede o limite UDP ({0} bytes)")]
    TooLarge(usize),

    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("Erro de deserialização: {0}")]
    Deserialize(String),
}

/// Codifica um [`PushMessage`] para transmissão UDP.
pub fn encode_push(push: &PushMessage) -> Result<Vec<u8>, ProtocolError> {
    let body = bincode::serialize(push).map_err(|e| ProtocolError::Serialize(e.to_string()))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
    frame.push(MAGIC_BYTE);
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&body);

    if frame.len() > MAX_UDP_PAYLOAD {
        return Err(ProtocolError::TooLarge(frame.len()));
    }
    Ok(frame)
}

/// Decodifica um frame recebido via UDP.
pub fn decode_push(data: &[u8]) -> Result<PushMessage, ProtocolError> {
    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::TooShort(data.len()));
    }

    let magic = data[0];
    if magic != MAGIC_BYTE {
        return Err(ProtocolError::InvalidMagic(magic));
    }

    let version = data[1];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch(version));
    }

    bincode::deserialize(&data[HEADER_SIZE..]).map_err(|e| ProtocolError::Deserialize(e.to_string()))
}
