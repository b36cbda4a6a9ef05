//! Каналы трансляции данных и поддерживающие методы.

use crate::config::{CHANNEL_TIMEOUT_MS, REPRICE_INTERVAL_MS};
use crate::market::Marketplace;
use crate::models::ClientManager;
use crate::store::MarketStore;
use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use log::{error, info, warn};
use std::sync::atomic::AtomicBool;
use std::{
    sync::atomic::Ordering,
    sync::{Arc, Mutex},
    thread,
    thread::JoinHandle,
    time::Duration,
};

/// Запустить периодический пересчёт цен каталога.
///
/// Каждые [`REPRICE_INTERVAL_MS`] пересчитывает цены всех незамороженных
/// товаров (детерминированный вариант формулы) и отправляет применённые
/// обновления в канал трансляции. Пересчёт идёт, пока работает сервер.
pub fn start_repricer<S>(
    market: Arc<Mutex<Marketplace<S>>>,
    tx: Sender<String>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    S: MarketStore + Send + 'static,
{
    thread::spawn(move || {
        info!("Пересчёт цен запущен");

        loop {
            thread::sleep(Duration::from_millis(REPRICE_INTERVAL_MS));

            if stop.load(Ordering::SeqCst) {
                break;
            }

            let updates = {
                let market = match market.lock() {
                    Ok(m) => m,
                    Err(_) => {
                        warn!("Пересчёт цен: ошибка блокировки маркетплейса");
                        continue;
                    }
                };

                match market.reprice_all(commons::utils::get_timestamp()) {
                    Ok(updates) => updates,
                    Err(err) => {
                        error!("Ошибка пересчёта цен: {}", err);
                        continue;
                    }
                }
            };

            for update in updates {
                match tx.send_timeout(
                    update.to_string(),
                    Duration::from_millis(CHANNEL_TIMEOUT_MS),
                ) {
                    Ok(_) => (),
                    Err(SendTimeoutError::Timeout(_)) => {
                        warn!("Канал обновлений цен занят (timeout)");
                    }
                    Err(SendTimeoutError::Disconnected(_)) => {
                        warn!("Канал обновлений цен закрыт");
                        return;
                    }
                }
            }
        }

        info!("Пересчёт цен остановлен");
    })
}

/// Диспетчер подписчиков на обновления цен.
///
/// ## Args
///
/// - `main_receiver` — основной канал обновлений от пересчёта цен
/// - `clients` — экземпляр [`ClientManager`] с данными о клиентах
/// - `stop` — прерывание работы диспетчера внешней командой
pub fn price_dispatcher(
    main_receiver: Receiver<String>,
    clients: Arc<Mutex<ClientManager>>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            if stop.load(Ordering::SeqCst) {
                break;
            }

            match main_receiver.recv_timeout(Duration::from_millis(CHANNEL_TIMEOUT_MS)) {
                Ok(update) => {
                    let senders: Vec<_> = {
                        let clients = match clients.lock() {
                            Ok(c) => c,
                            Err(_) => {
                                warn!("Диспетчер цен: ошибка блокировки ClientManager");
                                continue;
                            }
                        };

                        clients
                            .clients
                            .iter()
                            .filter(|(_, client)| !client.stop_flag.load(Ordering::SeqCst))
                            .map(|(id_client, client)| (*id_client, client.sender.clone()))
                            .collect()
                    };

                    updates_sender(senders, &update);
                }

                Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

/// Менеджер рассылки обновлений цен по подписчикам.
///
/// ## Args
///
/// - `senders` — id клиентов и отправители активных подписчиков
/// - `message` — сообщение для рассылки
fn updates_sender(senders: Vec<(usize, Sender<String>)>, message: &str) {
    for (id, tx) in senders {
        match tx.send_timeout(
            message.to_string(),
            Duration::from_millis(CHANNEL_TIMEOUT_MS),
        ) {
            Ok(_) => (),
            Err(SendTimeoutError::Timeout(_)) => {
                warn!("Канал обновлений занят (timeout) (ошибка отправки клиенту {id})");
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                error!("Канал обновлений закрыт");
                break;
            }
        }
    }
}
