//! Конфигурационный файл Market Client.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Название директории для log-файлов.
pub const LOG_FOLDER: &str = "log";

/// Адрес TCP-сервера по умолчанию.
const DEFAULT_SERVER_SOCKET: &str = "127.0.0.1";

pub fn default_server_socket() -> Ipv4Addr {
    Ipv4Addr::from_str(DEFAULT_SERVER_SOCKET)
        .unwrap_or_else(|e| panic!("Invalid default server address: {}", e))
}

/// Порт для подключения к TCP-серверу по умолчанию.
pub const DEFAULT_SERVER_PORT: u16 = 8888;

/// Диапазон разрешённых TCP-портов.
pub const ALLOW_TCP_PORTS: RangeInclusive<u16> = RangeInclusive::new(1024, 49151);

/// Диапазон разрешённых в приложении UDP-портов.
pub const ALLOW_UDP_PORTS: RangeInclusive<u16> = RangeInclusive::new(1024, 49151);

/// Базовый UDP-адрес для приёма данных от сервера.
pub const UDP_CALLBACK: &str = "127.0.0.1";

/// Значения формы нового товара по умолчанию.
pub const DEFAULT_INITIAL_PRICE: f64 = 1000.0;

/// Себестоимость по умолчанию.
pub const DEFAULT_COST_PRICE: f64 = 500.0;

/// Максимальная цена по умолчанию.
pub const DEFAULT_MAX_PRICE: f64 = 10_000.0;

/// Тираж по умолчанию.
pub const DEFAULT_INITIAL_SUPPLY: u32 = 100;

/// Длительность продаж по умолчанию, дни.
pub const DEFAULT_DURATION_DAYS: u64 = 100;

/// Чувствительность по умолчанию.
pub const DEFAULT_SENSITIVITY: f64 = 0.1;

/// Изображение-заглушка для товара без собственной картинки.
pub const DEFAULT_IMAGE: &str = "https://images.unsplash.com/photo-1595950653106-6c9ebd614d3a";
