//! Конфигурация приложения.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

/// Название директории для log-файлов.
pub const LOG_FOLDER: &str = "log";

/// Название каталога для хранения данных проекта.
pub const DATA_FOLDER: &str = "data";

/// Файл каталога товаров (весь каталог — один JSON-массив).
pub const PRODUCTS_FILENAME: &str = "products.json";

/// Файл истории транзакций аккаунта.
pub const TRANSACTIONS_FILENAME: &str = "transactions.json";

/// Файл профиля пользователя.
pub const PROFILE_FILENAME: &str = "profile.json";

/// Адрес работы TCP-сервера.
pub const SERVER_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Порт TCP-сервера по умолчанию.
pub const DEFAULT_SERVER_PORT: u16 = 8888;

/// Диапазон разрешённых TCP-портов.
pub const TCP_PORTS_ALLOWED: RangeInclusive<u16> = RangeInclusive::new(1024, 49151);

/// Интервал периодического пересчёта цен, миллисекунды.
///
/// Пересчёт выполняется, пока работает сервер — как в витрине, открытой
/// в одной вкладке: закрыли процесс, цены замерли.
pub const REPRICE_INTERVAL_MS: u64 = 60_000;

/// Таймаут опроса каналов диспетчера, миллисекунды.
pub const CHANNEL_TIMEOUT_MS: u64 = 500;

/// Таймаут ожидания ping от UDP-подписчика, секунды.
pub const UDP_PING_TIMEOUT_SECS: u64 = 10;

/// Приветствие TCP-сервера.
pub const WELCOME_SERVER: &str = "Market Server. Торговая площадка лимитированных товаров.\n";

/// Справка по командам сервера.
pub const WELCOME_INFO: &str = "Команды: LIST | SHOW <id> | ADD <json> | BUY <id> <кол-во> | \
ACCOUNT | CONNECT | DISCONNECT | BALANCE | STREAM <udp-url> <ALL|id,id> | CANCEL\n";

/// Маркер готовности сервера к приёму команд.
pub const WELCOME_TERMINATOR: &str = "READY\n";

/// Параметры формулы ценообразования.
#[derive(Debug, Clone, Copy)]
pub struct PricingSettings {
    /// Предельная доля временного спада цены к концу окна продаж.
    pub time_decay_limit: f64,
    /// Нижняя граница случайного колебания цены при покупке.
    pub fluctuation_floor: f64,
    /// Масштаб вклада чувствительности в случайное колебание.
    pub fluctuation_span: f64,
}

/// Предустановленные параметры ценообразования.
///
/// Цена падает не более чем вдвое к концу окна продаж, колебание при
/// покупке лежит в `[0.95, 0.95 + чувствительность * 0.1)`.
pub const PRICING: PricingSettings = PricingSettings {
    time_decay_limit: 0.5,
    fluctuation_floor: 0.95,
    fluctuation_span: 0.1,
};

/// Фиксированный адрес получателя платежей маркетплейса.
pub const RECIPIENT_ADDRESS: &str = "MRKTp1aceho1derRec1pientAddre55111111111111";

/// Комиссия сети за перевод.
pub const GAS_FEE: f64 = 0.000005;

/// Диапазон стартового баланса симулируемого кошелька.
pub const SIM_WALLET_BALANCE: (f64, f64) = (10_000.0, 100_000.0);

/// Алфавит base58 для адресов и подписей.
pub const BASE58_ALPHABET: &str =
    "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Длина адреса кошелька.
pub const WALLET_ADDRESS_LEN: usize = 44;

/// Длина подписи транзакции.
pub const TX_SIGNATURE_LEN: usize = 88;
