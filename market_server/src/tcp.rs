//! Механизация TCP-сервера.

use crate::channels::{price_dispatcher, start_repricer};
use crate::cli::ServerSet;
use crate::config::{DATA_FOLDER, WELCOME_INFO, WELCOME_SERVER, WELCOME_TERMINATOR};
use crate::market::Marketplace;
use crate::models::{ClientManager, ClientSubscription};
use crate::store::{FileStore, MarketStore};
use crate::udp::spawn_stream;
use crate::wallet::{SimulatedWallet, WalletBridge};
use commons::models::PriceUpdate;
use commons::utils::{get_timestamp, get_workspace_root};
use commons::{errors::MarketError, traits::WriteExt};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{error, info};
use macros::MarketEnumDisplay;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering}, Arc,
    Mutex,
};
use std::{
    collections::HashSet,
    fmt::Display,
    io,
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener, TcpStream},
    str::FromStr,
    thread::{sleep, spawn},
    time::Duration,
};
use url::Url;

/// Счётчик клиентов.
static CLIENTS_COUNTER: AtomicUsize = AtomicUsize::new(1000);

/// Увеличить значение счётчика клиентов и вернуть уникальное значение.
fn gen_id() -> usize {
    CLIENTS_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Общее окружение обработчиков клиентов.
pub(crate) struct ServerCtx<S: MarketStore> {
    /// Маркетплейс поверх общего хранилища.
    pub market: Arc<Mutex<Marketplace<S>>>,
    /// Кошелёк покупателя.
    pub wallet: Arc<Mutex<SimulatedWallet>>,
    /// Подписчики на обновления цен.
    pub clients: Arc<Mutex<ClientManager>>,
}

impl<S: MarketStore> Clone for ServerCtx<S> {
    fn clone(&self) -> Self {
        Self {
            market: Arc::clone(&self.market),
            wallet: Arc::clone(&self.wallet),
            clients: Arc::clone(&self.clients),
        }
    }
}

/// Тип ответа сервера клиенту.
enum ServerResponse {
    /// Успешное исполнение команды.
    Ok { message: Option<String> },
    /// Ошибка при выполнении команды.
    Err { message: Option<String> },
}

impl Display for ServerResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerResponse::Ok { message } => match message {
                Some(msg) => write!(f, "OK|{}", msg),
                None => write!(f, "OK"),
            },
            ServerResponse::Err { message } => match message {
                Some(msg) => write!(f, "ERROR|{}", msg),
                None => write!(f, "ERROR"),
            },
        }
    }
}

impl ServerResponse {
    /// Отправить ответ клиенту одной строкой.
    ///
    /// Пример: `OK|Успешно`.
    ///
    /// ## Args
    ///
    /// - `writer` — TCP-поток для записи ответа
    /// - `addr` — адрес TCP-сокета клиента
    /// - `log` — если `true`, сообщение также записывается в лог-файл
    pub fn send(&self, writer: &mut TcpStream, addr: SocketAddr, log: bool) {
        let response = self.to_string();
        if log {
            info!("Ответ: {} для клиента {}", response, addr);
        }
        writer.write_line(&response);
    }

    /// Успешный ответ.
    pub fn ok(message: &str) -> Self {
        if message.trim().is_empty() {
            ServerResponse::Ok { message: None }
        } else {
            ServerResponse::Ok {
                message: Some(message.to_string()),
            }
        }
    }

    /// Ответ с ошибкой.
    pub fn err(message: &str) -> Self {
        if message.trim().is_empty() {
            ServerResponse::Err { message: None }
        } else {
            ServerResponse::Err {
                message: Some(message.to_string()),
            }
        }
    }
}

/// Команды клиента.
#[derive(Debug, MarketEnumDisplay)]
enum Command {
    /// Каталог товаров.
    #[str("list")]
    List,
    /// Карточка товара.
    #[str("show")]
    Show,
    /// Добавить товар.
    #[str("add")]
    Add,
    /// Купить товар.
    #[str("buy")]
    Buy,
    /// Профиль и история транзакций.
    #[str("account")]
    Account,
    /// Подключить кошелёк.
    #[str("connect")]
    Connect,
    /// Отключить кошелёк.
    #[str("disconnect")]
    Disconnect,
    /// Баланс кошелька.
    #[str("balance")]
    Balance,
    /// Подписка на поток обновлений цен.
    #[str("stream")]
    Stream,
    /// Отменить подписку.
    #[str("cancel")]
    Cancel,
}

/// Создать подписку клиента на обновления цен.
///
/// ## Args
///
/// - `cmd_parts` — аргументы команды: UDP-ссылка и `ALL` либо список
///   идентификаторов товаров через запятую
/// - `known_ids` — идентификаторы существующих товаров для проверки
fn make_subscription(
    unique_id: usize,
    tcp_addr: SocketAddr,
    sender: Sender<String>,
    recv: Receiver<String>,
    cmd_parts: &[String],
    known_ids: &HashSet<String>,
) -> Result<ClientSubscription, MarketError> {
    if cmd_parts.len() < 2 {
        return Err(MarketError::command_err("команда неполная"));
    }

    let udp_url = Url::parse(&cmd_parts[0]).map_err(|err| {
        MarketError::command_err(format!(
            "некорректный udp-адрес '{}': {}",
            &cmd_parts[0], err
        ))
    })?;
    if udp_url.scheme() != "udp" {
        return Err(MarketError::command_err("поддерживается только UDP"));
    }

    let product_ids = match cmd_parts[1].to_uppercase().as_str() {
        "ALL" => HashSet::new(),
        _ => {
            let input_set: HashSet<String> = cmd_parts[1]
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            if input_set.is_subset(known_ids) {
                input_set
            } else {
                return Err(MarketError::command_err("некорректные идентификаторы товаров"));
            }
        }
    };

    Ok(ClientSubscription::new(
        unique_id,
        tcp_addr,
        udp_url,
        product_ids,
        sender,
        recv,
    ))
}

/// Выполнить команду клиента.
///
/// ## Returns
///
/// Полезная нагрузка успешного ответа (`OK|<нагрузка>`), либо ошибка,
/// которая уйдёт клиенту как `ERROR|<сообщение>`.
fn dispatch<S: MarketStore>(
    command: &Command,
    parts: &[String],
    ctx: &ServerCtx<S>,
    id_client: usize,
    addr: SocketAddr,
    sender: &Sender<String>,
    receiver: &Receiver<String>,
) -> Result<String, MarketError> {
    match command {
        Command::List => {
            let market = ctx.market.lock()?;
            let products = market.products()?;
            to_json(&products)
        }

        Command::Show => {
            let id = parts
                .first()
                .ok_or_else(|| MarketError::command_err("укажите идентификатор товара"))?;
            let market = ctx.market.lock()?;
            to_json(&market.product(id)?)
        }

        Command::Add => {
            if parts.is_empty() {
                return Err(MarketError::command_err("отсутствует форма товара"));
            }
            let payload = parts.join(" ");
            let form = serde_json::from_str(&payload)
                .map_err(|err| MarketError::command_err(format!("некорректная форма: {}", err)))?;

            let market = ctx.market.lock()?;
            to_json(&market.add_product(form, get_timestamp())?)
        }

        Command::Buy => {
            let id = parts
                .first()
                .ok_or_else(|| MarketError::command_err("укажите идентификатор товара"))?;
            let quantity = match parts.get(1) {
                Some(raw) => raw
                    .parse::<u32>()
                    .map_err(|_| MarketError::command_err(format!("некорректное количество: {}", raw)))?,
                None => 1,
            };

            let market = ctx.market.lock()?;
            let mut wallet = ctx.wallet.lock()?;
            to_json(&market.purchase(id, quantity, get_timestamp(), &mut *wallet)?)
        }

        Command::Account => {
            let market = ctx.market.lock()?;
            to_json(&market.account(get_timestamp())?)
        }

        Command::Connect => ctx.wallet.lock()?.connect(),

        Command::Disconnect => {
            ctx.wallet.lock()?.disconnect();
            Ok("disconnected".to_string())
        }

        Command::Balance => {
            let balance = ctx.wallet.lock()?.balance()?;
            Ok(format!("{:.4}", balance))
        }

        Command::Stream => {
            let products = {
                let market = ctx.market.lock()?;
                market.products()?
            };
            let known_ids: HashSet<String> = products.iter().map(|p| p.id.clone()).collect();

            let client = make_subscription(
                id_client,
                addr,
                sender.clone(),
                receiver.clone(),
                parts,
                &known_ids,
            )?;

            // Стартовый срез цен: подписчик сразу получает текущие значения,
            // не дожидаясь периодического пересчёта.
            let now = get_timestamp();
            for product in &products {
                if client.wants(&product.id) {
                    let update = PriceUpdate {
                        product_id: product.id.clone(),
                        price: product.latest_price(),
                        timestamp: now,
                    };
                    let _ = client.sender.send(update.to_string());
                }
            }

            let mut clients = ctx.clients.lock()?;
            clients.add_client(client.clone()).ok();
            spawn_stream(client);

            Ok("stream started".to_string())
        }

        Command::Cancel => {
            if let Ok(client) = ctx.clients.lock()?.remove_client(id_client) {
                client.stop_flag.store(true, Ordering::SeqCst);
            }
            Ok("canceled".to_string())
        }
    }
}

/// Сериализовать полезную нагрузку ответа в JSON.
fn to_json<T: serde::Serialize>(value: &T) -> Result<String, MarketError> {
    serde_json::to_string(value)
        .map_err(|err| MarketError::value_err(format!("ошибка сериализации: {}", err)))
}

/// Организатор работы TCP-сервера.
pub fn run_server(settings: ServerSet) -> io::Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .unwrap_or_else(|e| panic!("Ошибка установки Ctrl-C: {}", e));

    // Инициализация окружения.
    let store = FileStore::new(get_workspace_root().join(DATA_FOLDER));
    let ctx = ServerCtx {
        market: Arc::new(Mutex::new(Marketplace::new(store))),
        wallet: Arc::new(Mutex::new(SimulatedWallet::new())),
        clients: Arc::new(Mutex::new(ClientManager::new())),
    };

    let (update_tx, update_rx) = unbounded();
    let stop_workers = Arc::new(AtomicBool::new(false));
    let handle_repricer = start_repricer(
        Arc::clone(&ctx.market),
        update_tx,
        Arc::clone(&stop_workers),
    );
    let handle_dispatcher = price_dispatcher(
        update_rx,
        Arc::clone(&ctx.clients),
        Arc::clone(&stop_workers),
    );

    // Запуск сервера.
    let listener = TcpListener::bind(settings.server_addr)?;
    listener.set_nonblocking(true)?;

    println!("Запущен сервер по адресу {}", settings.server_addr);
    println!("Завершить работу сервера с помощью CTRL-C/CTRL-BREAK.\n");
    info!("Market Server запущен");

    loop {
        if !running.load(Ordering::SeqCst) {
            info!("Работа сервера прервана...");
            stop_workers.store(true, Ordering::SeqCst);
            break;
        }

        match listener.accept() {
            Ok((stream, addr)) => {
                let id_client = gen_id();

                // Создание персонального канала Диспетчер - клиент.
                let (tx_client, rx_client) = unbounded();

                let ctx = ctx.clone();

                info!("Рукопожатие: {:?}", addr);
                spawn(move || handle_client(stream, addr, tx_client, rx_client, ctx, id_client));
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                sleep(Duration::from_millis(50));
            }
            Err(e) => {
                error!("Ошибка работы сервера: {}", e);
                break;
            }
        }
    }

    info!("Завершение работы...");

    // Остановка клиентов.
    if let Ok(mut manager) = ctx.clients.lock() {
        for (_, client) in manager.clients.iter_mut() {
            client.stop_flag.store(true, Ordering::SeqCst);
            info!("Клиент {} деактивирован", client.tcp_addr);
        }
    }

    // Остановка потока пересчёта цен.
    if let Err(err) = handle_repricer.join() {
        error!("Поток пересчёта цен завершился с паникой: {:?}", err);
    }

    // Остановка диспетчера.
    if let Err(err) = handle_dispatcher.join() {
        error!("Диспетчер потока завершился паникой: {:?}", err);
    }

    Ok(())
}

/// Взаимодействие с новым клиентом.
///
/// ## Args
///
/// - `stream` — экземпляр `TcpStream` сервер-клиент
/// - `addr` — адрес сокета клиента
/// - `sender` — канал отправки сообщения клиенту (`crossbeam_channel`)
/// - `receiver` — канал получения сообщения клиентом (`crossbeam_channel`)
///   для трансляции обновлений цен
/// - `ctx` — общее окружение сервера [`ServerCtx`]
/// - `id_client` — индивидуальный ID клиента
fn handle_client<S: MarketStore>(
    stream: TcpStream,
    addr: SocketAddr,
    sender: Sender<String>,
    receiver: Receiver<String>,
    ctx: ServerCtx<S>,
    id_client: usize,
) -> io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    writer.write_str(WELCOME_SERVER);
    writer.write_str(WELCOME_INFO);
    writer.flush_ext();
    writer.write_str(WELCOME_TERMINATOR);

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => {
                let input = line.trim();
                if input.is_empty() {
                    ServerResponse::err("empty line").send(&mut writer, addr, false);
                    continue;
                }

                let mut parts: Vec<String> =
                    input.split_whitespace().map(|s| s.to_string()).collect();

                let cmd = parts.remove(0);
                match Command::from_str(&cmd) {
                    Ok(command) => {
                        match dispatch(&command, &parts, &ctx, id_client, addr, &sender, &receiver)
                        {
                            Ok(payload) => {
                                ServerResponse::ok(&payload).send(&mut writer, addr, false);
                            }
                            Err(err) => {
                                ServerResponse::err(err.to_string().as_str()).send(
                                    &mut writer,
                                    addr,
                                    false,
                                );
                            }
                        }
                    }

                    Err(_) => {
                        ServerResponse::err("invalid command").send(&mut writer, addr, false);
                    }
                }
            }
            Err(_) => {
                error!("Ошибка чтения: '{}' от {}", line.trim_end(), addr);
                return Ok(());
            }
        }
    }
}
