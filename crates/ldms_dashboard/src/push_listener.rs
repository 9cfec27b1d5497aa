//! Thread que escuta os pushes do watch via UDP e os entrega à UI.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use ldms_core::notification::Notification;
use ldms_core::protocol::decode_push;
use std::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Push recebido, já convertido em notificação.
#[derive(Debug, Clone)]
pub struct PushEvent {
    pub notification: Notification,
    pub source_addr: String,
    pub raw_size: usize,
}

/// Inicia a thread de escuta. Retorna o receiver do channel.
pub fn spawn_push_listener(port: u16, watch_ip_filter: String) -> std::io::Result<Receiver<PushEvent>> {
    let (tx, rx) = bounded::<PushEvent>(64);

    std::thread::Builder::new()
        .name("push-listener".into())
        .spawn(move || {
            listener_loop(&tx, port, &watch_ip_filter);
        })?;

    Ok(rx)
}

/// Filtro de origem. Vazio aceita qualquer IP.
fn accepts(source: &str, filter: &str) -> bool {
    filter.is_empty() || source == filter
}

fn listener_loop(tx: &Sender<PushEvent>, port: u16, watch_ip_filter: &str) {
    loop {
        match UdpSocket::bind(format!("0.0.0.0:{port}")) {
            Ok(sock) => {
                sock.set_read_timeout(Some(std::time::Duration::from_secs(1)))
                    .ok();

                let mode = if watch_ip_filter.is_empty() {
                    "qualquer origem"
                } else {
                    watch_ip_filter
                };
                info!("Escutando pushes em 0.0.0.0:{port} – Origem: {mode}");

                let mut buf = [0u8; 65536];
                loop {
                    match sock.recv_from(&mut buf) {
                        Ok((size, addr)) => {
                            let source = addr.ip().to_string();

                            if !accepts(&source, watch_ip_filter) {
                                debug!("Ignorando push de {source} (esperado: {watch_ip_filter})");
                                continue;
                            }

                            match decode_push(&buf[..size]) {
                                Ok(push) => {
                                    let event = PushEvent {
                                        notification: Notification::from_push(&push),
                                        source_addr: source,
                                        raw_size: size,
                                    };
                                    match tx.try_send(event) {
                                        Ok(()) => {}
                                        // Non-blocking: se a UI está lenta, descarta
                                        Err(TrySendError::Full(_)) => {
                                            debug!("Channel cheio, descartando push");
                                        }
                                        Err(TrySendError::Disconnected(_)) => {
                                            info!("UI encerrada, parando escuta de pushes");
                                            return;
                                        }
                                    }
                                }
                                Err(e) => {
                                    debug!("Frame inválido de {source}: {e}");
                                }
                            }
                        }
                        Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut
                            || e.kind() == std::io::ErrorKind::WouldBlock =>
                        {
                            // Timeout normal, continua
                        }
                        Err(e) => {
                            warn!("Erro ao receber UDP: {e}");
                        }
                    }
                }
            }
            Err(e) => {
                error!("Falha ao bind porta {port}: {e}. Tentando novamente em 2s...");
                std::thread::sleep(std::time::Duration::from_secs(2));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldms_core::notification::PushMessage;
    use ldms_core::protocol::encode_push;
    use std::time::Duration;

    #[test]
    fn source_filter() {
        assert!(accepts("10.0.0.7", ""));
        assert!(accepts("10.0.0.7", "10.0.0.7"));
        assert!(!accepts("10.0.0.8", "10.0.0.7"));
    }

    #[test]
    fn delivers_decoded_pushes_and_skips_garbage() {
        // Porta livre emprestada do SO
        let port = UdpSocket::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let rx = spawn_push_listener(port, String::new()).unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let frame = encode_push(&PushMessage::high_risk("node_3")).unwrap();

        // A thread pode ainda não ter feito bind: reenvia até chegar
        let mut got = None;
        for _ in 0..20 {
            sender.send_to(b"lixo", ("127.0.0.1", port)).unwrap();
            sender.send_to(&frame, ("127.0.0.1", port)).unwrap();
            if let Ok(ev) = rx.recv_timeout(Duration::from_millis(250)) {
                got = Some(ev);
                break;
            }
        }

        let ev = got.expect("nenhum push recebido");
        assert_eq!(ev.notification.sensor(), Some("node_3"));
        assert_eq!(ev.source_addr, "127.0.0.1");
        assert_eq!(ev.raw_size, frame.len());
    }
}
