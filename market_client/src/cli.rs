//! Обработка аргументов командной строки при запуске приложения.
//!
//! Пользователь может указать:
//! - адрес и порт TCP-сервера
//! - порт для приёма UDP-данных (для подписки на обновления цен)
//! - команду маркетплейса: каталог, карточка, добавление, покупка,
//!   аккаунт, операции кошелька, подписка

use crate::config::*;
use clap::{Parser, Subcommand};
use commons::get_id_data;
use commons::models::ProductForm;
use log::error;
use std::fmt::{Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::process::exit;
use url::Url;

/// Перечисление ошибок при завершении приложения.
#[derive(Copy, Clone)]
#[repr(u8)]
#[allow(dead_code)]
enum ExitCode {
    /// Ошибка формирования сокета TCP.
    InvalidServerSocket = 1,
    /// Ошибка формирования ссылки UDP.
    InvalidUDP,
    /// Не указан UDP-порт для подписки.
    MissingUdpPort,
}

impl ExitCode {
    /// Предоставить цифровое значение выбранного перечисления (`u8`).
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Parser)]
#[command(about = "Market Client. Limited edition marketplace console client.")]
#[command(author, version, long_about = None)]
struct CliArgs {
    /// TCP server socket address.
    #[arg(short, long, required = false, default_value_t = default_server_socket())]
    socket: Ipv4Addr,

    /// TCP server port (for example 8888).
    #[arg(short, long, required = false, default_value_t = DEFAULT_SERVER_PORT, value_parser=validate_tcp_port
    )]
    port: u16,

    /// UDP port for receiving price updates (required for `stream`).
    #[arg(short, long, required = false, value_parser=validate_udp_port)]
    udp: Option<u16>,

    /// Supported server commands.
    #[command(subcommand)]
    command: Commands,
}

/// Валидатор для полей `port` и аналогичных.
fn port_in_range(s: &str, range: RangeInclusive<u16>) -> Result<u16, String> {
    let port: u16 = s.parse().map_err(|_| format!("invalid port number: {s}"))?;
    if range.contains(&port) {
        Ok(port)
    } else {
        Err(format!(
            "port number {} not in range {} — {}",
            s,
            range.start(),
            range.end()
        ))
    }
}

/// Валидатор для поля `port`.
fn validate_tcp_port(s: &str) -> Result<u16, String> {
    port_in_range(s, ALLOW_TCP_PORTS)
}

/// Валидатор для поля `udp`.
fn validate_udp_port(s: &str) -> Result<u16, String> {
    port_in_range(s, ALLOW_UDP_PORTS)
}

/// Supported server commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the whole product catalog.
    List,
    /// Fetch a single product card by id.
    Show {
        /// Product id.
        id: String,
    },
    /// Create a new product.
    Add {
        /// Product name.
        #[arg(long)]
        name: String,
        /// Product description.
        #[arg(long, default_value = "")]
        description: String,
        /// Product image URL.
        #[arg(long, default_value = DEFAULT_IMAGE)]
        image: String,
        /// Initial price.
        #[arg(long, default_value_t = DEFAULT_INITIAL_PRICE)]
        initial_price: f64,
        /// Cost price (lower bound).
        #[arg(long, default_value_t = DEFAULT_COST_PRICE)]
        cost_price: f64,
        /// Max price (upper bound).
        #[arg(long, default_value_t = DEFAULT_MAX_PRICE)]
        max_price: f64,
        /// Initial supply.
        #[arg(long, default_value_t = DEFAULT_INITIAL_SUPPLY)]
        initial_supply: u32,
        /// Sale duration, days.
        #[arg(long, default_value_t = DEFAULT_DURATION_DAYS)]
        duration_days: u64,
        /// Random fluctuation sensitivity, 0.01-1.0.
        #[arg(long, default_value_t = DEFAULT_SENSITIVITY)]
        sensitivity: f64,
    },
    /// Buy a product.
    Buy {
        /// Product id.
        id: String,
        /// Quantity (clamped to the remaining supply).
        #[arg(default_value_t = 1)]
        quantity: u32,
    },
    /// Show profile and transaction history.
    Account,
    /// Connect the wallet.
    Connect,
    /// Disconnect the wallet.
    Disconnect,
    /// Show the wallet balance.
    Balance,
    /// Subscribe to price updates. `File path`: filters to product ids
    /// listed in the file. `No file`: all catalog updates (ALL)
    Stream {
        #[arg(short, long, required = false, value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Cancel previously scheduled price updates.
    Cancel,
}

/// Параметры, полученные из командной строки при запуске приложения.
pub struct ClientSet {
    /// Адрес TCP-сервера.
    pub server_addr: SocketAddr,
    /// UDP-адрес для получения данных (только для подписки).
    pub udp_url: Option<Url>,
    /// Подготовленная команда для сервера.
    pub command: String,
    /// Команда открывает поток обновлений цен.
    pub stream: bool,
}

impl Display for ClientSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.udp_url {
            Some(udp) => write!(f, "server: {} | udp: {}", self.server_addr, udp),
            None => write!(f, "server: {}", self.server_addr),
        }
    }
}

impl ClientSet {
    /// Сформировать экземпляр [`ClientSet`] на основе данных из командной
    /// строки.
    ///
    /// При обнаружении ошибок в значениях приложение завершится.
    fn new(args: &CliArgs) -> Self {
        let server_addr = Self::make_server_addr(args.socket, args.port);
        let stream = matches!(args.command, Commands::Stream { .. });

        let udp_url = match (stream, args.udp) {
            (true, None) => exit_err(
                "для подписки укажите UDP-порт (--udp)",
                ExitCode::MissingUdpPort,
            ),
            (_, Some(port)) => Some(Self::make_udp_url(port)),
            (false, None) => None,
        };

        let command = Self::make_command(&args.command, udp_url.as_ref());

        Self {
            server_addr,
            udp_url,
            command,
            stream,
        }
    }

    /// Сформировать адрес сокета TCP-сервера.
    ///
    /// ## Args
    ///
    /// - `address` — валидный сокет в [`Ipv4Addr`]
    /// - `port` — корректный TCP-порт, в разрешённом конфигурацией приложения
    ///   диапазоне
    fn make_server_addr(address: Ipv4Addr, port: u16) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(address, port))
    }

    /// Проверить UDP-порт и вернуть корректный UDP-адрес.
    ///
    /// В случае ошибки приложение завершается с выводом причины.
    fn make_udp_url(port_udp: u16) -> Url {
        Url::parse(&format!("udp://{}:{}", UDP_CALLBACK, port_udp)).unwrap_or_else(|error| {
            let err_msg = format!(
                "не удалось сформировать `udp_url` (base_url: {}, port: {}): {}",
                UDP_CALLBACK, port_udp, error
            );
            exit_err(&err_msg, ExitCode::InvalidUDP)
        })
    }

    /// Получить список идентификаторов для подписки из файла.
    fn get_ids(path: &PathBuf) -> Vec<String> {
        get_id_data(path).unwrap_or_default()
    }

    /// Сформировать команду для сервера на основе пользовательского выбора.
    fn make_command(command: &Commands, udp_url: Option<&Url>) -> String {
        match command {
            Commands::List => "LIST".to_string(),
            Commands::Show { id } => format!("SHOW {}", id),
            Commands::Add {
                name,
                description,
                image,
                initial_price,
                cost_price,
                max_price,
                initial_supply,
                duration_days,
                sensitivity,
            } => {
                let form = ProductForm {
                    name: name.clone(),
                    description: description.clone(),
                    image: image.clone(),
                    initial_price: *initial_price,
                    cost_price: *cost_price,
                    max_price: *max_price,
                    initial_supply: *initial_supply,
                    duration_days: *duration_days,
                    sensitivity: *sensitivity,
                };
                let payload = serde_json::to_string(&form)
                    .unwrap_or_else(|e| panic!("Ошибка сериализации формы: {e}"));

                format!("ADD {}", payload)
            }
            Commands::Buy { id, quantity } => format!("BUY {} {}", id, quantity),
            Commands::Account => "ACCOUNT".to_string(),
            Commands::Connect => "CONNECT".to_string(),
            Commands::Disconnect => "DISCONNECT".to_string(),
            Commands::Balance => "BALANCE".to_string(),
            Commands::Stream { file } => {
                let ids = match file {
                    Some(path) => Self::get_ids(path),
                    None => vec![],
                };

                let args = match ids.is_empty() {
                    true => "ALL".to_string(),
                    false => ids.join(","),
                };

                let udp = udp_url.expect("UDP-адрес проверен при разборе аргументов");
                format!("STREAM {} {}", udp, args)
            }
            Commands::Cancel => "CANCEL".to_string(),
        }
    }
}

/// Получить от пользователя первичные настройки приложения.
///
/// Гарантировано, что данные получены и проверены в доступных пределах.
/// Например, что `server_addr` содержит ссылку и порт (но не гарантируется,
/// что ссылка ведёт к действующему серверу).
///
/// ## Обработка ошибок
///
/// Если полученные данные некорректные, приложение завершает работу с выводом
/// сообщения об ошибке в консоль и log-файл. При завершении работы приложение
/// возвращает ОС ошибку, в соответствии с [`ExitCode`].
pub fn parse_cli_args() -> ClientSet {
    let args = CliArgs::parse();

    ClientSet::new(&args)
}

/// Опубликовать сообщение об ошибке и завершить работу приложения.
fn exit_err(message: &str, code: ExitCode) -> ! {
    error!("Ошибка: {} (код {})", message, code.value());
    eprintln!("Ошибка: {}", message);
    exit(code.value() as i32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn tcp_port_validator_accepts_allowed() {
        let ok = ALLOW_TCP_PORTS.start().to_string();
        assert!(validate_tcp_port(&ok).is_ok());
    }

    #[test]
    fn udp_port_validator_rejects_out_of_range() {
        let bad = (ALLOW_UDP_PORTS.end() + 1).to_string();
        assert!(validate_udp_port(&bad).is_err());
    }

    #[test]
    fn make_udp_url_is_correct() {
        let url = ClientSet::make_udp_url(34254);
        assert_eq!(url.as_str(), format!("udp://{}:34254", UDP_CALLBACK));
    }

    #[test]
    fn stream_command_all_if_no_file() {
        let udp_url = Url::parse("udp://127.0.0.1:34254").unwrap();
        let cmd = ClientSet::make_command(&Commands::Stream { file: None }, Some(&udp_url));

        assert_eq!(cmd, "STREAM udp://127.0.0.1:34254 ALL");
    }

    #[test]
    fn stream_command_from_file() {
        let tmp = std::env::temp_dir().join("product_ids_test.txt");
        fs::write(&tmp, "1700000000001\n1700000000002\n").unwrap();

        let udp_url = Url::parse("udp://127.0.0.1:34254").unwrap();
        let cmd = ClientSet::make_command(&Commands::Stream { file: Some(tmp) }, Some(&udp_url));

        assert_eq!(
            cmd,
            "STREAM udp://127.0.0.1:34254 1700000000001,1700000000002"
        );
    }

    #[test]
    fn buy_command_includes_quantity() {
        let cmd = ClientSet::make_command(
            &Commands::Buy {
                id: "1700000000001".to_string(),
                quantity: 3,
            },
            None,
        );
        assert_eq!(cmd, "BUY 1700000000001 3");
    }

    #[test]
    fn add_command_carries_json_form() {
        let cmd = ClientSet::make_command(
            &Commands::Add {
                name: "Vinyl".to_string(),
                description: "Numbered".to_string(),
                image: DEFAULT_IMAGE.to_string(),
                initial_price: 100.0,
                cost_price: 50.0,
                max_price: 200.0,
                initial_supply: 10,
                duration_days: 30,
                sensitivity: 0.1,
            },
            None,
        );

        let payload = cmd.strip_prefix("ADD ").unwrap();
        let form: ProductForm = serde_json::from_str(payload).unwrap();
        assert_eq!(form.name, "Vinyl");
        assert_eq!(form.initial_supply, 10);
    }
}
