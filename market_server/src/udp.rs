//! Механизация серверного UDP-протокола.

use crate::config::UDP_PING_TIMEOUT_SECS;
use crate::models::ClientSubscription;
use log::{error, info};
use std::{
    net::UdpSocket,
    sync::atomic::Ordering,
    thread,
    time::{Duration, Instant},
};

/// Запустить UDP-поток обновлений цен для клиента.
///
/// Обновление уходит подписчику, если его набор товаров пуст (подписка
/// на весь каталог) или содержит идентификатор из сообщения.
pub fn spawn_stream(client: ClientSubscription) {
    thread::spawn(move || {
        let udp_addr = client
            .udp_url
            .socket_addrs(|| None)
            .ok()
            .and_then(|v| v.first().cloned());

        let Some(udp_addr) = udp_addr else {
            error!("Некорректный UDP адрес");
            return;
        };

        let socket = UdpSocket::bind("0.0.0.0:0").expect("Не удалось привязаться к UDP-сокету");
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .expect("Ошибка параметра `set_read_timeout`");

        info!("UDP трансляция на адрес: {}", udp_addr);

        let mut last_ping = Instant::now();
        let mut buf = [0u8; 64];

        loop {
            if client.stop_flag.load(Ordering::SeqCst) {
                break;
            }

            if last_ping.elapsed() > Duration::from_secs(UDP_PING_TIMEOUT_SECS) {
                info!("Таймаут ожидания пинга от клиента. Трансляция прервана");
                break;
            }

            if let Ok((size, _)) = socket.recv_from(&mut buf) {
                let msg = String::from_utf8_lossy(&buf[..size]).to_ascii_lowercase();
                if msg.trim() == "ping" {
                    last_ping = Instant::now();
                }
            }

            if let Ok(update) = client.recv.recv_timeout(Duration::from_millis(200))
                && let Some(product_id) = extract_product_id(&update)
                && client.wants(product_id)
            {
                let _ = socket.send_to(update.as_bytes(), udp_addr);
            }
        }

        info!("UDP трансляция остановлена");
    });
}

/// Извлечь идентификатор товара из строки обновления формата `id|цена|метка`.
fn extract_product_id(update: &str) -> Option<&str> {
    update
        .split('|')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::extract_product_id;

    #[test]
    fn extract_product_id_pipe_format() {
        let update = "1700000000001|142.5|1700000100";
        assert_eq!(extract_product_id(update), Some("1700000000001"));
    }

    #[test]
    fn extract_product_id_empty() {
        let update = "   ";
        assert_eq!(extract_product_id(update), None);
    }

    #[test]
    fn extract_product_id_single_field() {
        let update = "1700000000001";
        assert_eq!(extract_product_id(update), Some("1700000000001"));
    }
}
