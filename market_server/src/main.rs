//! Market Server. Консольное приложение торговой площадки лимитированных
//! товаров: каталог с динамическим ценообразованием, покупка через
//! симулируемый кошелёк, трансляция обновлений цен подписчикам.

use commons::init_simple_logger;
use commons::utils::get_workspace_root;
use log::error;

mod channels;
mod cli;
mod config;
mod market;
mod models;
mod pricing;
mod store;
mod tcp;
mod udp;
mod wallet;

use cli::parse_cli_args;
use config::LOG_FOLDER;
use tcp::run_server;

fn main() -> std::io::Result<()> {
    // Инициализация логгера.
    init_logger();

    let settings = parse_cli_args();

    if let Err(e) = run_server(settings) {
        error!("Сервер завершился с ошибкой: {}", e);
        return Err(e);
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
