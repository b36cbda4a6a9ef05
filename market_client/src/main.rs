//! Market Client. Приложение для взаимодействия с Market Server.

use log::{info, warn};
use std::io::{BufRead, BufReader, Result, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod cli;
mod config;
mod udp;

use cli::parse_cli_args;
use commons::init_simple_logger;
use commons::utils::get_workspace_root;
use config::LOG_FOLDER;
use udp::UdpClient;

fn main() -> Result<()> {
    init_logger();

    info!("Market Client запущен");
    let settings = parse_cli_args();

    let stream = TcpStream::connect(settings.server_addr)?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    info!("Установлено соединение с сервером: {}", settings);

    // Пропуск welcome-строк и технической информации.
    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            break;
        }
        if line.trim_end().to_uppercase() == "READY" {
            break;
        }
    }

    // Отправка установочного запроса на сервер.
    writer.write_all(settings.command.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!("Отправлена команда: {}", settings.command);

    let mut server_response = String::new();
    let bytes = reader.read_line(&mut server_response)?;
    if bytes == 0 {
        let err_msg = "Пустой ответ от сервера или сервер закрыл соединение.";
        warn!("{}", err_msg);
        panic!("{}", err_msg);
    }

    info!("Ответ сервера: {}", server_response.trim_end());
    println!("{}", server_response.trim_end());

    // Приём потока обновлений цен до прерывания пользователем.
    if settings.stream {
        let udp_url = settings
            .udp_url
            .as_ref()
            .expect("UDP-адрес проверен при разборе аргументов");
        let udp_client = UdpClient::bind_url(udp_url)?;

        let stop = Arc::new(AtomicBool::new(false));
        let s = stop.clone();
        ctrlc::set_handler(move || {
            s.store(true, Ordering::SeqCst);
        })
        .unwrap_or_else(|e| panic!("Ошибка установки Ctrl-C: {}", e));

        println!("Приём обновлений цен. Завершить с помощью CTRL-C/CTRL-BREAK.\n");

        let handle_ping = udp_client.spawn_ping(stop.clone());
        udp_client.recv_loop(stop);

        if handle_ping.join().is_err() {
            warn!("Поток Ping завершился с паникой");
        }
    }

    Ok(())
}

/// Инициализировать логгер приложения.
///
/// Используется метод [`init_simple_logger`] из крейта [`commons`].
fn init_logger() {
    let log_folder = get_workspace_root().join(LOG_FOLDER);
    let app_name = env!("CARGO_PKG_NAME");
    init_simple_logger(app_name, log_folder);
}
